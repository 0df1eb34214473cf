pub mod config;
pub mod permissions;

use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};

use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

pub struct SystemService {
    storage: Option<Arc<dyn Storage>>,
}

impl SystemService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Option<Arc<dyn Storage>> {
        if let Some(storage) = &self.storage {
            return Some(storage.clone());
        }
        request
            .app_data::<web::Data<Arc<dyn Storage>>>()
            .map(|data| data.get_ref().clone())
    }

    // 评分器的单元格超时设置，仅课程工作人员可见
    pub async fn get_config(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        config::get_config(self, request).await
    }

    // 当前用户在各课程中的角色
    pub async fn get_permissions(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        permissions::get_permissions(self, request).await
    }
}

pub(crate) fn internal_error(message: impl Into<String>) -> HttpResponse {
    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
        ErrorCode::InternalServerError,
        message,
    ))
}
