//! 执行器的 git 工作区：从 origin 拉取指定分支，把结果推送为新分支

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::command::{GitCli, stderr_text};
use crate::config::GitConfig;
use crate::errors::{GraderError, Result};

/// 推送时暂存哪些文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSelection {
    /// `git add -A`
    All,
    /// 只暂存这些相对路径
    Only(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct SubmissionWorkspaceManager {
    git: GitCli,
    committer_name: String,
    committer_email: String,
}

impl SubmissionWorkspaceManager {
    pub fn new(config: &GitConfig) -> Self {
        Self {
            git: GitCli::new(config.executable.clone()),
            committer_name: config.committer_name.clone(),
            committer_email: config.committer_email.clone(),
        }
    }

    /// 清空工作区后拉取 `origin_repo` 的 `branch`
    pub async fn pull_submission(
        &self,
        workspace_dir: &Path,
        origin_repo: &Path,
        branch: &str,
    ) -> Result<()> {
        recreate_dir(workspace_dir)
            .await
            .map_err(|e| GraderError::pull_failure(e.message().to_string()))?;

        let init = self.git.output(Some(workspace_dir), ["init"]).await?;
        if !init.status.success() && !workspace_dir.join(".git").exists() {
            return Err(GraderError::pull_failure(stderr_text(&init)));
        }

        info!(
            "Pulling branch {} from {} into {}",
            branch,
            origin_repo.display(),
            workspace_dir.display()
        );
        let pull = self
            .git
            .output(
                Some(workspace_dir),
                [
                    OsString::from("pull"),
                    origin_repo.as_os_str().to_owned(),
                    OsString::from(branch),
                ],
            )
            .await
            .map_err(|e| GraderError::pull_failure(e.message().to_string()))?;
        if !pull.status.success() {
            return Err(GraderError::pull_failure(stderr_text(&pull)));
        }
        Ok(())
    }

    /// 把工作区内容提交到 `branch` 并强制推送到 `destination_repo`
    pub async fn push_results(
        &self,
        workspace_dir: &Path,
        destination_repo: &Path,
        branch: &str,
        message: &str,
        files: &FileSelection,
    ) -> Result<()> {
        self.push_results_inner(workspace_dir, destination_repo, branch, message, files)
            .await
            .map_err(|e| match e {
                GraderError::PushFailure(_) => e,
                other => GraderError::push_failure(other.message().to_string()),
            })
    }

    async fn push_results_inner(
        &self,
        workspace_dir: &Path,
        destination_repo: &Path,
        branch: &str,
        message: &str,
        files: &FileSelection,
    ) -> Result<()> {
        if self.git.ensure_bare_repo(destination_repo).await? {
            info!("Initialized bare repository {}", destination_repo.display());
        }

        let cwd = Some(workspace_dir);
        self.git.run(cwd, ["init"]).await?;
        self.git.run(cwd, ["checkout", "-B", branch]).await?;

        match files {
            FileSelection::All => {
                self.git.run(cwd, ["add", "-A"]).await?;
            }
            FileSelection::Only(paths) if paths.is_empty() => {
                debug!("No files selected for {}", branch);
            }
            FileSelection::Only(paths) => {
                // 文件名按字面匹配，不解析 pathspec 的通配符与 ":" 前缀
                let mut args = vec![
                    "--literal-pathspecs".to_string(),
                    "add".to_string(),
                    "--".to_string(),
                ];
                args.extend(paths.iter().cloned());
                self.git.run(cwd, args).await?;
            }
        }

        let name = format!("user.name={}", self.committer_name);
        let email = format!("user.email={}", self.committer_email);
        self.git
            .run(
                cwd,
                [
                    "-c",
                    name.as_str(),
                    "-c",
                    email.as_str(),
                    "commit",
                    "--allow-empty",
                    "-m",
                    message,
                ],
            )
            .await?;

        info!(
            "Pushing branch {} to {}",
            branch,
            destination_repo.display()
        );
        self.git
            .run(
                cwd,
                [
                    OsString::from("push"),
                    OsString::from("--force"),
                    destination_repo.as_os_str().to_owned(),
                    OsString::from(format!("{branch}:{branch}")),
                ],
            )
            .await?;
        Ok(())
    }
}

/// 删除并重新创建目录
pub async fn recreate_dir(dir: &Path) -> Result<PathBuf> {
    if tokio::fs::try_exists(dir).await? {
        tokio::fs::remove_dir_all(dir).await?;
    }
    tokio::fs::create_dir_all(dir).await?;
    Ok(dir.to_path_buf())
}
