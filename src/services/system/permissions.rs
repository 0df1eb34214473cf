use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{SystemService, internal_error};
use crate::middlewares::RequireGitAuth;
use crate::models::{ApiResponse, ErrorCode};

/// 列出当前用户的 `{lecture_code, scope}`
pub async fn get_permissions(
    service: &SystemService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let Some(user) = RequireGitAuth::extract_user(request) else {
        return Ok(HttpResponse::Unauthorized()
            .json(ApiResponse::error_empty(ErrorCode::Unauthorized, "未登录")));
    };
    let Some(storage) = service.get_storage(request) else {
        return Ok(internal_error("Storage not found in app data"));
    };

    match storage.list_user_permissions(user.id).await {
        Ok(permissions) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            permissions,
            "Permissions retrieved successfully",
        ))),
        Err(e) => Ok(internal_error(format!("获取课程角色失败: {e}"))),
    }
}
