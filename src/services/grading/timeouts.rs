use serde::Serialize;

use crate::config::GraderConfig;
use crate::errors::{GraderError, Result};

/// 单元格执行超时（秒），构造时校验 `0 < min < default < max`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellTimeouts {
    default_cell_timeout: u64,
    min_cell_timeout: u64,
    max_cell_timeout: u64,
}

impl CellTimeouts {
    pub fn new(default: u64, min: u64, max: u64) -> Result<Self> {
        if min == 0 {
            return Err(GraderError::configuration(format!(
                "min_cell_timeout must be greater than 0, got {min}"
            )));
        }
        if !(min < default && default < max) {
            return Err(GraderError::configuration(format!(
                "cell timeouts must satisfy min < default < max, got min={min} default={default} max={max}"
            )));
        }
        Ok(Self {
            default_cell_timeout: default,
            min_cell_timeout: min,
            max_cell_timeout: max,
        })
    }

    pub fn from_config(config: &GraderConfig) -> Result<Self> {
        Self::new(
            config.default_cell_timeout,
            config.min_cell_timeout,
            config.max_cell_timeout,
        )
    }

    pub fn default_timeout(&self) -> u64 {
        self.default_cell_timeout
    }

    pub fn min(&self) -> u64 {
        self.min_cell_timeout
    }

    pub fn max(&self) -> u64 {
        self.max_cell_timeout
    }

    /// 作业自带的超时在 [min, max] 内时使用它，否则使用默认值
    pub fn effective(&self, requested: Option<u64>) -> u64 {
        match requested {
            Some(t) if (self.min_cell_timeout..=self.max_cell_timeout).contains(&t) => t,
            _ => self.default_cell_timeout,
        }
    }
}
