use std::ffi::OsStr;
use std::io::Read;

use actix_web::{HttpRequest, HttpResponse, http::header, web};
use flate2::read::GzDecoder;
use futures_util::StreamExt;

use super::{GitService, lookup};
use crate::config::LimitConfig;
use crate::errors::{GraderError, Result};
use crate::git::command::stderr_text;
use crate::git::protocol::{GitEndpoint, GitRequestPath, result_content_type};

const GIT_PROTOCOL_HEADER: &str = "Git-Protocol";
const DEFAULT_PAYLOAD_LIMIT: usize = 64 * 1024 * 1024;

/// `git-upload-pack` / `git-receive-pack` 的无状态 RPC
pub async fn service_rpc(
    service: &GitService,
    request: &HttpRequest,
    tail: &str,
    payload: web::Payload,
) -> Result<HttpResponse> {
    let target = GitRequestPath::parse(tail)?;
    let GitEndpoint::Rpc(operation) = target.endpoint else {
        return Err(GraderError::not_found(format!("Unknown git endpoint: /git/{tail}")));
    };

    let repo = lookup::resolve_repo(service, request, &target, operation).await?;

    let limit = request
        .app_data::<web::Data<LimitConfig>>()
        .map(|l| l.max_payload_size)
        .unwrap_or(DEFAULT_PAYLOAD_LIMIT);
    let body = read_payload(payload, limit).await?;
    let input = decode_body(request, body)?;

    let mut envs = Vec::new();
    if let Some(protocol) = request
        .headers()
        .get(GIT_PROTOCOL_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        envs.push(("GIT_PROTOCOL", protocol.to_string()));
    }

    let output = repo
        .git
        .output_with_input(
            [
                OsStr::new(operation.subcommand()),
                OsStr::new("--stateless-rpc"),
                repo.path.as_os_str(),
            ],
            &envs,
            input,
        )
        .await?;
    if !output.status.success() {
        return Err(GraderError::git_operation(stderr_text(&output)));
    }

    Ok(HttpResponse::Ok()
        .content_type(result_content_type(operation))
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .body(output.stdout))
}

// 读取原始请求体，超过上限时拒绝
async fn read_payload(mut payload: web::Payload, limit: usize) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| GraderError::validation(format!("Invalid request body: {e}")))?;
        if body.len() + chunk.len() > limit {
            return Err(GraderError::validation("Request body too large"));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// git 客户端在请求较大时会用 gzip 压缩请求体
pub fn decode_body(request: &HttpRequest, body: Vec<u8>) -> Result<Vec<u8>> {
    let gzip = request
        .headers()
        .get(header::CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("gzip"));
    if !gzip {
        return Ok(body);
    }

    let mut decoded = Vec::new();
    GzDecoder::new(body.as_slice())
        .read_to_end(&mut decoded)
        .map_err(|e| GraderError::validation(format!("Invalid gzip request body: {e}")))?;
    Ok(decoded)
}
