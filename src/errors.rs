//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码、类型名称和 HTTP 状态码。

use std::fmt;

use actix_web::{HttpResponse, ResponseError, http::StatusCode, http::header::CONTENT_TYPE};

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - status() 方法 - 返回对应的 HTTP 状态码
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_grader_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal, $status:ident)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum GraderError {
            $($variant(String),)*
        }

        impl GraderError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(GraderError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(GraderError::$variant(_) => $type_name,)*
                }
            }

            /// 获取对应的 HTTP 状态码
            pub fn status(&self) -> StatusCode {
                match self {
                    $(GraderError::$variant(_) => StatusCode::$status,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(GraderError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl GraderError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        GraderError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_grader_errors! {
    InvalidPath("E001", "Invalid Path Error", BAD_REQUEST),
    Permission("E002", "Permission Error", FORBIDDEN),
    NotFound("E003", "Resource Not Found", NOT_FOUND),
    Configuration("E004", "Configuration Error", INTERNAL_SERVER_ERROR),
    PullFailure("E005", "Pull Failure", INTERNAL_SERVER_ERROR),
    PushFailure("E006", "Push Failure", INTERNAL_SERVER_ERROR),
    ConvertFailure("E007", "Convert Failure", INTERNAL_SERVER_ERROR),
    GitOperation("E008", "Git Operation Error", INTERNAL_SERVER_ERROR),
    LateSubmission("E009", "Late Submission Error", UNPROCESSABLE_ENTITY),
    Validation("E010", "Validation Error", BAD_REQUEST),
    Authentication("E011", "Authentication Error", UNAUTHORIZED),
    DatabaseConfig("E012", "Database Configuration Error", INTERNAL_SERVER_ERROR),
    DatabaseConnection("E013", "Database Connection Error", INTERNAL_SERVER_ERROR),
    DatabaseOperation("E014", "Database Operation Error", INTERNAL_SERVER_ERROR),
    FileOperation("E015", "File Operation Error", INTERNAL_SERVER_ERROR),
    Serialization("E016", "Serialization Error", INTERNAL_SERVER_ERROR),
    DateParse("E017", "Date Parse Error", BAD_REQUEST),
}

impl GraderError {
    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    /// 执行器中可以落库为失败状态的错误（拉取、转换、推送）
    pub fn is_run_failure(&self) -> bool {
        matches!(
            self,
            GraderError::PullFailure(_) | GraderError::PushFailure(_) | GraderError::ConvertFailure(_)
        )
    }
}

impl fmt::Display for GraderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for GraderError {}

// git 客户端只显示纯文本，因此错误响应统一使用 text/plain
impl ResponseError for GraderError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status())
            .insert_header((CONTENT_TYPE, "text/plain; charset=utf-8"))
            .body(self.message().to_string())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for GraderError {
    fn from(err: sea_orm::DbErr) -> Self {
        GraderError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for GraderError {
    fn from(err: std::io::Error) -> Self {
        GraderError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for GraderError {
    fn from(err: serde_json::Error) -> Self {
        GraderError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for GraderError {
    fn from(err: chrono::ParseError) -> Self {
        GraderError::DateParse(err.to_string())
    }
}

impl From<glob::PatternError> for GraderError {
    fn from(err: glob::PatternError) -> Self {
        GraderError::Validation(format!("invalid whitelist pattern: {err}"))
    }
}

impl From<walkdir::Error> for GraderError {
    fn from(err: walkdir::Error) -> Self {
        GraderError::FileOperation(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GraderError>;
