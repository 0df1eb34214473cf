use super::SeaOrmStorage;
use crate::entity::submissions::{ActiveModel, Entity as Submissions};
use crate::errors::{GraderError, Result};
use crate::models::submissions::entities::{Submission, SubmissionResultUpdate};
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, Set};

impl SeaOrmStorage {
    /// 通过 ID 获取提交
    pub async fn get_submission_by_id_impl(&self, id: i64) -> Result<Option<Submission>> {
        let result = Submissions::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("查询提交失败: {e}")))?;

        Ok(result.map(|m| m.into_submission()))
    }

    /// 写回评分结果，只更新有值的字段
    pub async fn save_submission_result_impl(
        &self,
        submission_id: i64,
        update: SubmissionResultUpdate,
    ) -> Result<()> {
        let existing = Submissions::find_by_id(submission_id)
            .one(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("查询提交失败: {e}")))?
            .ok_or_else(|| GraderError::not_found(format!("Submission {submission_id} not found")))?;

        let mut model: ActiveModel = existing.into_active_model();

        if let Some(status) = update.auto_status {
            model.auto_status = Set(status.to_string());
        }
        if let Some(status) = update.feedback_status {
            model.feedback_status = Set(status.to_string());
        }
        if let Some(logs) = update.grading_logs {
            model.grading_logs = Set(Some(logs));
        }
        if let Some(score) = update.score {
            model.score = Set(Some(score));
        }
        if let Some(grading_score) = update.grading_score {
            model.grading_score = Set(Some(grading_score));
        }
        if let Some(properties) = update.properties {
            model.properties = Set(Some(properties));
        }
        model.updated_at = Set(chrono::Utc::now().timestamp());

        model
            .update(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("更新提交失败: {e}")))?;

        Ok(())
    }
}
