use std::sync::Arc;

use crate::config::DatabaseConfig;
use crate::errors::Result;
use crate::models::{
    assignments::entities::Assignment,
    lectures::entities::{Lecture, LecturePermission, Role},
    submissions::entities::{Submission, SubmissionResultUpdate},
    users::entities::User,
};

#[cfg(test)]
pub mod memory;
pub mod sea_orm_storage;

/// 核心只读取身份、课程、作业与提交信息，只写回提交的评分结果
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;

    /// 课程与角色
    // 通过课程代码获取课程
    async fn get_lecture_by_code(&self, code: &str) -> Result<Option<Lecture>>;
    // 通过ID获取课程
    async fn get_lecture_by_id(&self, id: i64) -> Result<Option<Lecture>>;
    // 获取用户在课程中的角色
    async fn get_role(&self, user_id: i64, lecture_id: i64) -> Result<Option<Role>>;
    // 列出用户在所有课程中的角色
    async fn list_user_permissions(&self, user_id: i64) -> Result<Vec<LecturePermission>>;

    /// 作业
    async fn get_assignment_by_id(&self, id: i64) -> Result<Option<Assignment>>;

    /// 提交
    // 通过ID获取提交
    async fn get_submission_by_id(&self, id: i64) -> Result<Option<Submission>>;
    // 执行器运行结束时一次性写回状态、日志与分数
    async fn save_submission_result(
        &self,
        submission_id: i64,
        update: SubmissionResultUpdate,
    ) -> Result<()>;
}

pub async fn create_storage(config: &DatabaseConfig) -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async(config).await?;
    Ok(Arc::new(storage))
}
