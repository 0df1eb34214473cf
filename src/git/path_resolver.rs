use std::path::{Component, Path, PathBuf};

use super::RepoType;
use crate::errors::{GraderError, Result};

const INVALID_PATH: &str = "Invalid repository path";

/// 把 (课程代码, 作业 ID, 仓库类型, 额外段) 映射为裸仓库目录
///
/// 布局：
/// - `source` / `release`：`<root>/<code>/<assignment>/<type>`
/// - `user` / `autograde` / `feedback`：`<root>/<code>/<assignment>/<type>/<owner>`
/// - `edit`：`<root>/<code>/<assignment>/edit/<submission id>`
///
/// 非法的段直接拒绝，不做任何规范化。
#[derive(Debug, Clone)]
pub struct RepoPathResolver {
    root: PathBuf,
}

impl RepoPathResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn resolve(
        &self,
        lecture_code: &str,
        assignment_id: i64,
        repo_type: RepoType,
        extra: &[&str],
    ) -> Result<PathBuf> {
        validate_segment(lecture_code)?;

        let expected = usize::from(repo_type.requires_extra());
        if extra.len() != expected {
            return Err(GraderError::invalid_path(INVALID_PATH));
        }
        for segment in extra {
            validate_segment(segment)?;
        }

        let mut path = self
            .root
            .join(lecture_code)
            .join(assignment_id.to_string())
            .join(repo_type.as_str());
        for segment in extra {
            path.push(segment);
        }

        if !path.starts_with(&self.root) || has_parent_component(&path) {
            return Err(GraderError::invalid_path(INVALID_PATH));
        }
        Ok(path)
    }
}

fn validate_segment(segment: &str) -> Result<()> {
    if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\', '\0'])
    {
        return Err(GraderError::invalid_path(INVALID_PATH));
    }
    Ok(())
}

fn has_parent_component(path: &Path) -> bool {
    path.components().any(|c| matches!(c, Component::ParentDir))
}
