/*!
 * Git 客户端认证中间件
 *
 * 令牌由外部认证服务签发，这里只负责校验。git 客户端只会发送 HTTP Basic
 * 认证，因此除了 `Authorization: Bearer <JWT>` / `Token <JWT>` 之外，还接受
 * 以 JWT 作为密码（或用户名）的 Basic 认证。
 *
 * ## 使用方法
 *
 * ```rust,ignore
 * use actix_web::web;
 * use crate::middlewares::RequireGitAuth;
 *
 * cfg.service(
 *     web::resource("/git/{tail:.*}")
 *         .wrap(RequireGitAuth)
 *         .route(web::get().to(info_refs)),
 * );
 * ```
 *
 * 处理程序中通过 `RequireGitAuth::extract_user(&req)` 获取当前用户。
 *
 * ## 认证流程
 *
 * 1. 从 `Authorization` 头中取出令牌
 * 2. 使用 `JwtConfig` 中的密钥校验令牌并读取用户 ID
 * 3. 从存储中加载用户，写入请求扩展
 * 4. 任一步失败时返回 401，并带上 `WWW-Authenticate: Basic realm="grader"`
 *    以便 git 客户端提示输入凭据
 */

use crate::config::JwtConfig;
use crate::models::users::entities::User;
use crate::storage::Storage;
use crate::utils::jwt::JwtUtils;
use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    http::header::{AUTHORIZATION, CONTENT_TYPE, WWW_AUTHENTICATE},
    web,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, sync::Arc};
use tracing::{debug, info};

const BEARER_PREFIX: &str = "Bearer ";
const TOKEN_PREFIX: &str = "Token ";
const BASIC_PREFIX: &str = "Basic ";
pub const AUTH_REALM: &str = "Basic realm=\"grader\"";

#[derive(Clone)]
pub struct RequireGitAuth;

// 辅助函数：创建 401 响应
fn unauthorized_response(message: &str) -> HttpResponse {
    HttpResponse::build(StatusCode::UNAUTHORIZED)
        .insert_header((WWW_AUTHENTICATE, AUTH_REALM))
        .insert_header((CONTENT_TYPE, "text/plain; charset=utf-8"))
        .body(message.to_string())
}

/// 从 Authorization 头中取出令牌
pub fn extract_token(header: &str) -> Option<String> {
    if let Some(token) = header
        .strip_prefix(BEARER_PREFIX)
        .or_else(|| header.strip_prefix(TOKEN_PREFIX))
    {
        let token = token.trim();
        return (!token.is_empty()).then(|| token.to_string());
    }

    let encoded = header.strip_prefix(BASIC_PREFIX)?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    let (username, password) = credentials.split_once(':')?;
    // 密码为空时把用户名当作令牌
    let token = if password.is_empty() { username } else { password };
    (!token.is_empty()).then(|| token.to_string())
}

// 辅助函数：提取并验证令牌，返回对应用户
async fn authenticate(req: &ServiceRequest) -> Result<User, String> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| "Missing Authorization header".to_string())?;
    let token = extract_token(header).ok_or_else(|| "Invalid Authorization header".to_string())?;

    let jwt = req
        .app_data::<web::Data<JwtConfig>>()
        .ok_or_else(|| "JWT configuration not found in app data".to_string())?;

    let claims = JwtUtils::verify_token(&token, &jwt.secret).map_err(|err| {
        info!("JWT token validation failed: {}", err);
        "Invalid token".to_string()
    })?;

    let user_id = claims
        .user_id()
        .ok_or_else(|| "Invalid user ID in token".to_string())?;

    let storage = req
        .app_data::<web::Data<Arc<dyn Storage>>>()
        .ok_or_else(|| "Storage not found in app data".to_string())?
        .get_ref()
        .clone();

    storage
        .get_user_by_id(user_id)
        .await
        .map_err(|_| "Failed to retrieve user from storage".to_string())?
        .ok_or_else(|| "User not found".to_string())
}

impl<S, B> Transform<S, ServiceRequest> for RequireGitAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireGitAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireGitAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireGitAuthMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireGitAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        Box::pin(async move {
            match authenticate(&req).await {
                Ok(user) => {
                    debug!("Authentication successful for user {}", user.username);
                    req.extensions_mut().insert(user);
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
                Err(err) => {
                    info!("Authentication failed for request to {}: {}", req.path(), err);
                    Ok(req.into_response(
                        unauthorized_response(&format!("Unauthorized: {err}"))
                            .map_into_right_body(),
                    ))
                }
            }
        })
    }
}

// 辅助函数：从请求中提取用户信息
impl RequireGitAuth {
    /// 从请求扩展中提取当前用户
    /// 此函数应该在应用了 RequireGitAuth 中间件的路由处理程序中使用
    pub fn extract_user(req: &actix_web::HttpRequest) -> Option<User> {
        req.extensions().get::<User>().cloned()
    }
}
