use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use tracing::warn;

use super::{SystemService, internal_error};
use crate::middlewares::RequireGitAuth;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::grading::CellTimeouts;

/// 返回当前生效的单元格超时（默认值与上下限）
///
/// 只要在任一课程中是助教、教师或管理员即可访问。
pub async fn get_config(
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

    let permissions = match storage.list_user_permissions(user.id).await {
        Ok(p) => p,
        Err(e) => return Ok(internal_error(format!("获取课程角色失败: {e}"))),
    };
    if !permissions.iter().any(|p| p.scope.is_staff()) {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::Forbidden,
            "仅课程工作人员可以查看评分配置",
        )));
    }

    let Some(timeouts) = request.app_data::<web::Data<CellTimeouts>>() else {
        warn!("CellTimeouts not registered in app data");
        return Ok(internal_error("Grader configuration not available"));
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        *timeouts.get_ref(),
        "Grader config retrieved successfully",
    )))
}
