use serde::{Deserialize, Serialize};

// 自动评分行为
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AutogradeType {
    Unassisted, // 不自动评分
    #[default]
    Auto, // 提交后自动评分
    FullAuto,   // 自动评分并生成反馈
}

// 迟交扣分区间，period 为 ISO-8601 时长（如 P1D、PT12H）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LateSubmissionRule {
    pub period: String,
    pub scaling: f64,
}

// 作业设置，以 JSON 文本形式存储在 assignments.settings 列
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AssignmentSettings {
    pub deadline: Option<chrono::DateTime<chrono::Utc>>,
    pub late_submission: Vec<LateSubmissionRule>,
    pub allowed_files: Vec<String>,
    pub extra_files: Vec<String>,
    pub autograde_type: AutogradeType,
    pub cell_timeout: Option<u64>,
}

impl AssignmentSettings {
    /// 从数据库中的 JSON 文本解析，空字符串视为默认设置
    pub fn from_json(raw: &str) -> crate::errors::Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(raw)?)
    }
}

// 作业实体
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assignment {
    pub id: i64,
    pub lecture_id: i64,
    pub name: String,
    pub settings: AssignmentSettings,
}
