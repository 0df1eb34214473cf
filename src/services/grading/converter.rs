//! 转换器调用方式：进程内或子进程

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{info, warn};

use super::ExecutorMode;
use super::log_capture::capture_logs;
use crate::errors::{GraderError, Result};
use crate::models::assignments::entities::AssignmentSettings;

/// 一次转换的输入
#[derive(Debug, Clone)]
pub struct ConvertJob {
    pub mode: ExecutorMode,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub file_pattern: String,
    pub settings: AssignmentSettings,
    /// 只有自动评分会传入
    pub cell_timeout: Option<u64>,
}

/// 转换结果：日志总是返回，即使转换失败
#[derive(Debug)]
pub struct ConvertOutcome {
    pub logs: String,
    pub result: Result<()>,
}

/// 进程内的 notebook 转换器
///
/// 同步调用，在阻塞线程池中执行；通过 `tracing` 输出的日志会被收集。
pub trait Converter: Send + Sync {
    fn convert(&self, job: &ConvertJob) -> Result<()>;
}

#[async_trait]
pub trait ConverterStrategy: Send + Sync {
    async fn convert(&self, job: ConvertJob) -> ConvertOutcome;
}

/// 在当前进程中调用 `Converter`
pub struct InProcessStrategy {
    converter: Arc<dyn Converter>,
}

impl InProcessStrategy {
    pub fn new(converter: Arc<dyn Converter>) -> Self {
        Self { converter }
    }
}

#[async_trait]
impl ConverterStrategy for InProcessStrategy {
    async fn convert(&self, job: ConvertJob) -> ConvertOutcome {
        let converter = self.converter.clone();
        let joined = tokio::task::spawn_blocking(move || {
            capture_logs(|| {
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| converter.convert(&job)))
            })
        })
        .await;

        match joined {
            Ok((Ok(result), logs)) => ConvertOutcome {
                logs,
                result: result.map_err(|e| match e {
                    GraderError::ConvertFailure(_) => e,
                    other => GraderError::convert_failure(other.message().to_string()),
                }),
            },
            Ok((Err(_), logs)) => ConvertOutcome {
                logs,
                result: Err(GraderError::convert_failure("Converter panicked")),
            },
            Err(e) => ConvertOutcome {
                logs: String::new(),
                result: Err(GraderError::convert_failure(format!(
                    "Converter task failed: {e}"
                ))),
            },
        }
    }
}

/// 调用外部转换程序：
/// `<exe> <autograde|generate_feedback> -i <in> -o <out> -p <pattern> [--cell-timeout=N]`
pub struct SubprocessStrategy {
    executable: String,
}

impl SubprocessStrategy {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn command(&self, job: &ConvertJob) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.arg(job.mode.converter_command())
            .arg("-i")
            .arg(&job.input_dir)
            .arg("-o")
            .arg(&job.output_dir)
            .arg("-p")
            .arg(&job.file_pattern);
        if let Some(timeout) = job.cell_timeout {
            cmd.arg(format!("--cell-timeout={timeout}"));
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl ConverterStrategy for SubprocessStrategy {
    async fn convert(&self, job: ConvertJob) -> ConvertOutcome {
        let mut cmd = self.command(&job);
        info!("Running {:?}", cmd.as_std());

        let output = match cmd.output().await {
            Ok(output) => output,
            Err(e) => {
                let message = format!("Failed to run {}: {e}", self.executable);
                warn!("{}", message);
                return ConvertOutcome {
                    logs: message.clone(),
                    result: Err(GraderError::convert_failure(message)),
                };
            }
        };

        // stderr 原样作为评分日志
        let logs = String::from_utf8_lossy(&output.stderr).into_owned();
        let result = if output.status.success() {
            info!("Process has successfully completed execution!");
            Ok(())
        } else {
            warn!("Process has failed execution! ({})", output.status);
            Err(GraderError::convert_failure(format!(
                "Process has failed execution! ({})",
                output.status
            )))
        };
        ConvertOutcome { logs, result }
    }
}
