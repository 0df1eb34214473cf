use std::sync::Arc;

use tracing::warn;

use crate::config::AppConfig;
use crate::errors::{GraderError, Result};
use crate::services::grading::CellTimeouts;
use crate::storage::{Storage, create_storage};

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub timeouts: CellTimeouts,
}

/// 准备服务器启动的上下文
/// 包括存储、迁移与评分配置校验
pub async fn prepare_server_startup(config: &AppConfig) -> Result<StartupContext> {
    if config.jwt.secret.is_empty() {
        return Err(GraderError::configuration(
            "jwt.secret is empty; set JWT_SECRET to the secret of the auth service",
        ));
    }

    // 配置不合法时拒绝启动
    let timeouts = CellTimeouts::from_config(&config.grader)?;
    warn!(
        "Cell timeouts: default={}s min={}s max={}s",
        timeouts.default_timeout(),
        timeouts.min(),
        timeouts.max()
    );

    tokio::fs::create_dir_all(&config.git.root).await?;
    warn!("Git root: {}", config.git.root);

    let storage = create_storage(&config.database).await?;
    warn!("Storage backend initialized and migrations completed");

    Ok(StartupContext { storage, timeouts })
}
