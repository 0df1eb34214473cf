use std::ffi::OsStr;

use actix_web::{HttpRequest, HttpResponse, http::header};
use serde::Deserialize;

use super::{GitService, lookup};
use crate::errors::{GraderError, Result};
use crate::git::GitOperation;
use crate::git::command::stderr_text;
use crate::git::protocol::{
    GitEndpoint, GitRequestPath, advertisement_content_type, service_advertisement,
};

#[derive(Debug, Deserialize)]
pub struct InfoRefsQuery {
    pub service: Option<String>,
}

/// 引用发现：`# service=<svc>` + flush + `git <svc> --advertise-refs` 的输出
pub async fn info_refs(
    service: &GitService,
    request: &HttpRequest,
    tail: &str,
    query: InfoRefsQuery,
) -> Result<HttpResponse> {
    let target = GitRequestPath::parse(tail)?;
    if target.endpoint != GitEndpoint::InfoRefs {
        return Err(GraderError::not_found(format!("Unknown git endpoint: /git/{tail}")));
    }

    let operation = query
        .service
        .as_deref()
        .and_then(GitOperation::from_service)
        .ok_or_else(|| GraderError::validation("Missing or unsupported service parameter"))?;

    let repo = lookup::resolve_repo(service, request, &target, operation).await?;
    let output = repo
        .git
        .output(
            None,
            [
                OsStr::new(operation.subcommand()),
                OsStr::new("--stateless-rpc"),
                OsStr::new("--advertise-refs"),
                repo.path.as_os_str(),
            ],
        )
        .await?;
    if !output.status.success() {
        return Err(GraderError::git_operation(stderr_text(&output)));
    }

    let mut body = service_advertisement(operation);
    body.extend_from_slice(&output.stdout);

    Ok(HttpResponse::Ok()
        .content_type(advertisement_content_type(operation))
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .body(body))
}
