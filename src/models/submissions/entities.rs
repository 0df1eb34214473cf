use serde::{Deserialize, Serialize};

/// 为状态枚举生成 as_str / Display / FromStr
macro_rules! string_enum {
    ($name:ident { $($variant:ident => $value:literal),* $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)*
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok($name::$variant),)*
                    _ => Err(format!("Invalid {}: {s}", stringify!($name))),
                }
            }
        }
    };
}

// 自动评分状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AutoStatus {
    NotGraded,
    AutomaticallyGraded,
    GradingFailed,
}

string_enum!(AutoStatus {
    NotGraded => "not_graded",
    AutomaticallyGraded => "automatically_graded",
    GradingFailed => "grading_failed",
});

// 反馈生成状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStatus {
    NotGenerated,
    Generated,
    GenerationFailed,
}

string_enum!(FeedbackStatus {
    NotGenerated => "not_generated",
    Generated => "generated",
    GenerationFailed => "generation_failed",
});

// 人工评分状态（由外部 CRUD 层维护，这里只读）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ManualStatus {
    NotGraded,
    ManuallyGraded,
    BeingEdited,
}

string_enum!(ManualStatus {
    NotGraded => "not_graded",
    ManuallyGraded => "manually_graded",
    BeingEdited => "being_edited",
});

// 提交实体
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Submission {
    pub id: i64,
    pub assignment_id: i64,
    pub user_id: i64,
    pub commit_hash: String,
    pub auto_status: AutoStatus,
    pub feedback_status: FeedbackStatus,
    pub manual_status: ManualStatus,
    pub score: Option<f64>,
    pub grading_score: Option<f64>,
    pub score_scaling: f64,
    pub grading_logs: Option<String>,
    pub properties: Option<String>, // gradebook JSON
    pub edited: bool,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

/// 一次执行器运行结束时写回的字段，None 表示保持不变
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionResultUpdate {
    pub auto_status: Option<AutoStatus>,
    pub feedback_status: Option<FeedbackStatus>,
    pub grading_logs: Option<String>,
    pub score: Option<f64>,
    pub grading_score: Option<f64>,
    pub properties: Option<String>,
}
