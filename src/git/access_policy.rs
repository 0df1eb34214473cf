use super::{GitOperation, RepoType};
use crate::errors::{GraderError, Result};
use crate::models::lectures::entities::RoleScope;

/// 请求者在某门课程中的身份
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub user_id: i64,
    pub username: String,
    pub scope: RoleScope,
    pub lecture_id: i64,
}

impl Identity {
    fn owns(&self, owner: Option<&str>) -> bool {
        owner == Some(self.username.as_str())
    }
}

/// 判断一次 git 操作是否被允许
///
/// `owner` 对 `user` 仓库是路径中的用户名；对 `autograde` / `feedback`
/// 是提交所属的用户名，提交不存在或 ID 不合法时为 None。其余类型忽略。
///
/// | 类型      | 学生（本人） | 学生（他人） | 助教/教师/管理员 |
/// |-----------|--------------|--------------|------------------|
/// | source    | -            | -            | 读写             |
/// | release   | 读           | -            | 读写             |
/// | user      | 读写         | -            | 读               |
/// | edit      | -            | -            | 读写             |
/// | autograde | 读           | -            | 读               |
/// | feedback  | 读           | -            | 读               |
pub fn authorize(
    identity: &Identity,
    repo_type: RepoType,
    operation: GitOperation,
    owner: Option<&str>,
) -> Result<()> {
    let write = operation.is_write();
    let staff = identity.scope.is_staff();

    let allowed = match repo_type {
        RepoType::Source | RepoType::Edit => staff,
        RepoType::Release => staff || !write,
        RepoType::User => {
            if staff {
                !write
            } else {
                identity.owns(owner)
            }
        }
        // 这两类仓库只由执行器在文件系统上直接写入
        RepoType::Autograde | RepoType::Feedback => {
            !write && (staff || identity.owns(owner))
        }
    };

    if allowed {
        Ok(())
    } else {
        Err(GraderError::permission(format!(
            "{} is not allowed to {} the {} repository",
            identity.scope,
            if write { "push to" } else { "pull from" },
            repo_type
        )))
    }
}
