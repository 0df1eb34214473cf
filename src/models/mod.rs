//! 业务数据模型
//!
//! 与 `entity` 中的数据库实体分离，Storage 层负责相互转换。

pub mod assignments;
pub mod common;
pub mod lectures;
pub mod submissions;
pub mod users;

pub use common::response::ApiResponse;

/// API 业务错误码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    InternalServerError = 1005,
}
