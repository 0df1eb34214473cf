//! 提交实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "submissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub assignment_id: i64,
    pub user_id: i64,
    pub commit_hash: String,
    pub auto_status: String,
    pub feedback_status: String,
    pub manual_status: String,
    pub score: Option<f64>,
    pub grading_score: Option<f64>,
    pub score_scaling: f64,
    #[sea_orm(column_type = "Text", nullable)]
    pub grading_logs: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub properties: Option<String>,
    pub edited: bool,
    pub submitted_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::assignments::Entity",
        from = "Column::AssignmentId",
        to = "super::assignments::Column::Id"
    )]
    Assignment,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
}

impl Related<super::assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_submission(self) -> crate::models::submissions::entities::Submission {
        use crate::models::submissions::entities::{
            AutoStatus, FeedbackStatus, ManualStatus, Submission,
        };
        use chrono::{DateTime, Utc};

        Submission {
            id: self.id,
            assignment_id: self.assignment_id,
            user_id: self.user_id,
            commit_hash: self.commit_hash,
            auto_status: self
                .auto_status
                .parse::<AutoStatus>()
                .unwrap_or(AutoStatus::NotGraded),
            feedback_status: self
                .feedback_status
                .parse::<FeedbackStatus>()
                .unwrap_or(FeedbackStatus::NotGenerated),
            manual_status: self
                .manual_status
                .parse::<ManualStatus>()
                .unwrap_or(ManualStatus::NotGraded),
            score: self.score,
            grading_score: self.grading_score,
            score_scaling: self.score_scaling,
            grading_logs: self.grading_logs,
            properties: self.properties,
            edited: self.edited,
            submitted_at: DateTime::<Utc>::from_timestamp(self.submitted_at, 0)
                .unwrap_or_default(),
        }
    }
}
