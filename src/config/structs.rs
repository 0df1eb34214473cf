use serde::{Deserialize, Serialize};

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub database: DatabaseConfig,
    pub git: GitConfig,
    pub grader: GraderConfig,
}

/// 应用设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub system_name: String,
    pub environment: String,
    pub log_level: String,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub unix_socket_path: String,
    pub workers: usize,
    pub max_workers: usize,
    pub timeouts: TimeoutConfig,
    pub limits: LimitConfig,
}

/// 超时配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    pub client_request: u64,
    pub client_disconnect: u64,
    pub keep_alive: u64,
}

/// 限制配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitConfig {
    pub max_payload_size: usize, // git push 的 pack 也受此限制
}

/// JWT 配置（令牌由外部认证服务签发，这里只做校验）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    #[serde(skip_serializing, default)] // 不序列化到JSON响应中
    pub secret: String,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,    // 数据库连接 URL（从 scheme 自动推断类型）
    pub pool_size: u32, // 连接池大小
    pub timeout: u64,   // 连接超时 (秒)
}

/// Git 仓库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    pub root: String,       // 裸仓库根目录
    pub executable: String, // git 可执行文件
    pub committer_name: String,
    pub committer_email: String,
}

/// 评分执行器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraderConfig {
    pub tmp_root: String, // convert_in / convert_out 所在目录
    pub executor: ExecutorStrategy,
    pub convert_executable: String,
    pub default_cell_timeout: u64,
    pub min_cell_timeout: u64,
    pub max_cell_timeout: u64,
}

/// 转换器执行方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorStrategy {
    Local,   // 进程内调用
    Process, // 子进程调用
}
