//! Git Smart-HTTP 协议辅助：pkt-line 编码与请求路径解析

use super::{GitOperation, RepoType};
use crate::errors::{GraderError, Result};

pub const FLUSH_PKT: &[u8] = b"0000";

/// 编码一个 pkt-line：4 位十六进制长度（包含自身）+ 数据
pub fn pkt_line(data: &str) -> Vec<u8> {
    let mut line = format!("{:04x}", data.len() + 4).into_bytes();
    line.extend_from_slice(data.as_bytes());
    line
}

/// `info/refs` 响应开头的服务声明
pub fn service_advertisement(operation: GitOperation) -> Vec<u8> {
    let mut body = pkt_line(&format!("# service={}\n", operation.service_name()));
    body.extend_from_slice(FLUSH_PKT);
    body
}

pub fn advertisement_content_type(operation: GitOperation) -> String {
    format!("application/x-{}-advertisement", operation.service_name())
}

pub fn result_content_type(operation: GitOperation) -> String {
    format!("application/x-{}-result", operation.service_name())
}

/// 请求的目标端点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitEndpoint {
    InfoRefs,
    Rpc(GitOperation),
}

/// `/git/` 之后的路径：`<code>/<assignment>/<type>[/<extra>]/<endpoint>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRequestPath {
    pub lecture_code: String,
    pub assignment_id: i64,
    pub repo_type: RepoType,
    pub extra: Option<String>,
    pub endpoint: GitEndpoint,
}

impl GitRequestPath {
    pub fn parse(tail: &str) -> Result<Self> {
        let tail = tail.trim_start_matches('/');

        let (repo_part, endpoint) = if let Some(rest) = tail.strip_suffix("/info/refs") {
            (rest, GitEndpoint::InfoRefs)
        } else if let Some(rest) = tail.strip_suffix("/git-upload-pack") {
            (rest, GitEndpoint::Rpc(GitOperation::UploadPack))
        } else if let Some(rest) = tail.strip_suffix("/git-receive-pack") {
            (rest, GitEndpoint::Rpc(GitOperation::ReceivePack))
        } else {
            return Err(GraderError::not_found(format!("Unknown git endpoint: /git/{tail}")));
        };

        let segments: Vec<&str> = repo_part.split('/').collect();
        let (code, assignment, repo_type, extra) = match segments.as_slice() {
            [code, assignment, repo_type] => (*code, *assignment, *repo_type, None),
            [code, assignment, repo_type, extra] => {
                (*code, *assignment, *repo_type, Some((*extra).to_string()))
            }
            _ => return Err(GraderError::invalid_path("Invalid repository path")),
        };

        let assignment_id = assignment
            .parse::<i64>()
            .map_err(|_| GraderError::invalid_path("Invalid repository path"))?;
        let repo_type = repo_type
            .parse::<RepoType>()
            .map_err(|_| GraderError::invalid_path("Invalid repository path"))?;

        Ok(Self {
            lecture_code: code.to_string(),
            assignment_id,
            repo_type,
            extra,
            endpoint,
        })
    }
}
