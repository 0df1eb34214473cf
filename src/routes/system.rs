use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, middleware, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::services::SystemService;

// 懒加载的全局 SystemService 实例
static SYSTEM_SERVICE: Lazy<SystemService> = Lazy::new(SystemService::new_lazy);

pub async fn get_config(request: HttpRequest) -> ActixResult<HttpResponse> {
    SYSTEM_SERVICE.get_config(&request).await
}

pub async fn get_permissions(request: HttpRequest) -> ActixResult<HttpResponse> {
    SYSTEM_SERVICE.get_permissions(&request).await
}

// 配置路由
pub fn configure_system_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .wrap(middleware::Compress::default())
            .wrap(middlewares::RequireGitAuth)
            .route("/config", web::get().to(get_config))
            .route("/permissions", web::get().to(get_permissions)),
    );
}
