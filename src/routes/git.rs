use actix_web::{HttpRequest, HttpResponse, web};
use once_cell::sync::Lazy;

use crate::errors::GraderError;
use crate::middlewares::RequireGitAuth;
use crate::services::GitService;
use crate::services::git::InfoRefsQuery;

// 懒加载的全局 GitService 实例
static GIT_SERVICE: Lazy<GitService> = Lazy::new(GitService::new_lazy);

// 引用发现
pub async fn info_refs(
    req: HttpRequest,
    tail: web::Path<String>,
    query: web::Query<InfoRefsQuery>,
) -> Result<HttpResponse, GraderError> {
    GIT_SERVICE
        .info_refs(&req, &tail, query.into_inner())
        .await
}

// upload-pack / receive-pack
pub async fn service_rpc(
    req: HttpRequest,
    tail: web::Path<String>,
    payload: web::Payload,
) -> Result<HttpResponse, GraderError> {
    GIT_SERVICE.service_rpc(&req, &tail, payload).await
}

// 配置路由
pub fn configure_git_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/git/{tail:.*}")
            .wrap(RequireGitAuth)
            .route(web::get().to(info_refs))
            .route(web::post().to(service_rpc)),
    );
}
