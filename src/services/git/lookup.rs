use std::path::PathBuf;
use std::sync::Arc;

use actix_web::HttpRequest;
use tracing::{debug, info};

use super::GitService;
use crate::errors::{GraderError, Result};
use crate::git::command::is_bare_repo;
use crate::git::protocol::GitRequestPath;
use crate::git::{GitCli, GitOperation, Identity, RepoPathResolver, RepoType, authorize};
use crate::middlewares::RequireGitAuth;
use crate::models::assignments::entities::Assignment;
use crate::storage::Storage;

/// 通过权限检查、已在磁盘上存在的裸仓库
pub struct ResolvedRepo {
    pub path: PathBuf,
    pub git: GitCli,
}

/// 查询课程与作业、判断权限；推送时按需初始化裸仓库，读取不存在的仓库返回 404
pub async fn resolve_repo(
    service: &GitService,
    request: &HttpRequest,
    target: &GitRequestPath,
    operation: GitOperation,
) -> Result<ResolvedRepo> {
    let storage = service.get_storage(request)?;
    let config = service.get_git_config(request)?;

    let user = RequireGitAuth::extract_user(request)
        .ok_or_else(|| GraderError::authentication("Unauthorized"))?;

    let lecture = storage
        .get_lecture_by_code(&target.lecture_code)
        .await?
        .ok_or_else(|| GraderError::not_found("Lecture not found"))?;

    let assignment = storage
        .get_assignment_by_id(target.assignment_id)
        .await?
        .filter(|a| a.lecture_id == lecture.id)
        .ok_or_else(|| GraderError::not_found("Assignment not found"))?;

    let role = storage
        .get_role(user.id, lecture.id)
        .await?
        .ok_or_else(|| GraderError::permission("No role in this lecture"))?;

    let identity = Identity {
        user_id: user.id,
        username: user.username,
        scope: role.scope,
        lecture_id: lecture.id,
    };

    let resolver = RepoPathResolver::new(&config.root);
    let path = match target.repo_type {
        RepoType::Source | RepoType::Release => {
            if target.extra.is_some() {
                return Err(GraderError::invalid_path("Invalid repository path"));
            }
            authorize(&identity, target.repo_type, operation, None)?;
            resolver.resolve(&lecture.code, assignment.id, target.repo_type, &[])?
        }
        RepoType::User => {
            let owner = target
                .extra
                .clone()
                .unwrap_or_else(|| identity.username.clone());
            let path = resolver.resolve(&lecture.code, assignment.id, RepoType::User, &[owner.as_str()])?;
            authorize(&identity, RepoType::User, operation, Some(&owner))?;
            path
        }
        RepoType::Edit => {
            let submission_id = required_extra(target)?;
            authorize(&identity, RepoType::Edit, operation, None)?;
            if submission_owner(&storage, submission_id, &assignment).await?.is_none() {
                return Err(GraderError::not_found("Submission not found"));
            }
            resolver.resolve(&lecture.code, assignment.id, RepoType::Edit, &[submission_id])?
        }
        RepoType::Autograde | RepoType::Feedback => {
            let submission_id = required_extra(target)?;
            let owner = submission_owner(&storage, submission_id, &assignment).await?;
            // 先判断权限，学生无法借 404 探测他人的提交
            authorize(&identity, target.repo_type, operation, owner.as_deref())?;
            let owner = owner.ok_or_else(|| GraderError::not_found("Submission not found"))?;
            resolver.resolve(&lecture.code, assignment.id, target.repo_type, &[owner.as_str()])?
        }
    };

    let git = GitCli::new(&config.executable);
    if operation.is_write() {
        if git.ensure_bare_repo(&path).await? {
            info!("Initialized bare repository {}", path.display());
        }
    } else if !is_bare_repo(&path) {
        // 读操作不创建仓库
        return Err(GraderError::not_found("Repository not found"));
    }
    debug!(
        "User {} granted {} on {}",
        identity.username,
        operation.service_name(),
        path.display()
    );

    Ok(ResolvedRepo { path, git })
}

fn required_extra(target: &GitRequestPath) -> Result<&str> {
    target
        .extra
        .as_deref()
        .ok_or_else(|| GraderError::invalid_path("Invalid repository path"))
}

/// 提交 ID 对应的用户名；ID 非法、提交不存在或不属于该作业时为 None
async fn submission_owner(
    storage: &Arc<dyn Storage>,
    submission_id: &str,
    assignment: &Assignment,
) -> Result<Option<String>> {
    let Ok(id) = submission_id.parse::<i64>() else {
        return Ok(None);
    };
    let Some(submission) = storage
        .get_submission_by_id(id)
        .await?
        .filter(|s| s.assignment_id == assignment.id)
    else {
        return Ok(None);
    };
    Ok(storage
        .get_user_by_id(submission.user_id)
        .await?
        .map(|u| u.username))
}
