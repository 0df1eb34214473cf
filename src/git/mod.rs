//! Git 仓库相关的基础组件
//!
//! 路径解析、访问控制、Smart-HTTP 协议辅助函数、git 命令封装以及
//! 执行器使用的工作区管理。

pub mod access_policy;
pub mod command;
pub mod path_resolver;
pub mod protocol;
pub mod workspace;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use access_policy::{Identity, authorize};
pub use command::GitCli;
pub use path_resolver::RepoPathResolver;
pub use workspace::{FileSelection, SubmissionWorkspaceManager};

/// 仓库类型，同时决定磁盘目录与访问规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoType {
    Source,
    Release,
    User,
    Edit,
    Autograde,
    Feedback,
}

impl RepoType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepoType::Source => "source",
            RepoType::Release => "release",
            RepoType::User => "user",
            RepoType::Edit => "edit",
            RepoType::Autograde => "autograde",
            RepoType::Feedback => "feedback",
        }
    }

    /// 路径中是否需要额外的一段（用户名或提交 ID）
    pub fn requires_extra(&self) -> bool {
        !matches!(self, RepoType::Source | RepoType::Release)
    }
}

impl fmt::Display for RepoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepoType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "source" => Ok(RepoType::Source),
            "release" => Ok(RepoType::Release),
            "user" => Ok(RepoType::User),
            "edit" => Ok(RepoType::Edit),
            "autograde" => Ok(RepoType::Autograde),
            "feedback" => Ok(RepoType::Feedback),
            _ => Err(format!("Invalid repository type: {s}")),
        }
    }
}

/// Smart-HTTP 支持的两种 pack 协议
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GitOperation {
    UploadPack,  // 读：clone / fetch / pull
    ReceivePack, // 写：push
}

impl GitOperation {
    /// 服务名，例如 `git-upload-pack`
    pub fn service_name(&self) -> &'static str {
        match self {
            GitOperation::UploadPack => "git-upload-pack",
            GitOperation::ReceivePack => "git-receive-pack",
        }
    }

    /// 对应的 git 子命令
    pub fn subcommand(&self) -> &'static str {
        match self {
            GitOperation::UploadPack => "upload-pack",
            GitOperation::ReceivePack => "receive-pack",
        }
    }

    pub fn from_service(service: &str) -> Option<Self> {
        match service {
            "git-upload-pack" => Some(GitOperation::UploadPack),
            "git-receive-pack" => Some(GitOperation::ReceivePack),
            _ => None,
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(self, GitOperation::ReceivePack)
    }
}

/// 分支命名：`<prefix>_<commit hash>`
pub fn submission_branch(commit_hash: &str) -> String {
    format!("submission_{commit_hash}")
}

pub fn autograde_branch(commit_hash: &str) -> String {
    format!("autograde_{commit_hash}")
}

pub fn feedback_branch(commit_hash: &str) -> String {
    format!("feedback_{commit_hash}")
}
