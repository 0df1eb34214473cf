//! gradebook.json 的读写
//!
//! 文档结构由转换器决定，这里只读取 `notebooks` 下每个 notebook 的分数。

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::errors::{GraderError, Result};

pub const GRADEBOOK_FILE: &str = "gradebook.json";

pub fn gradebook_path(output_dir: &Path) -> PathBuf {
    output_dir.join(GRADEBOOK_FILE)
}

/// 把提交的 properties 写入输出目录，None 时不写
pub async fn write_gradebook(output_dir: &Path, properties: Option<&str>) -> Result<()> {
    if let Some(properties) = properties {
        tokio::fs::write(gradebook_path(output_dir), properties).await?;
    }
    Ok(())
}

/// 读取转换器写回的 gradebook
pub async fn read_gradebook(output_dir: &Path) -> Result<Value> {
    let path = gradebook_path(output_dir);
    let raw = tokio::fs::read_to_string(&path).await.map_err(|e| {
        GraderError::file_operation(format!("Failed to read {}: {e}", path.display()))
    })?;
    Ok(serde_json::from_str(&raw)?)
}

pub async fn remove_gradebook(output_dir: &Path) -> Result<()> {
    let path = gradebook_path(output_dir);
    if tokio::fs::try_exists(&path).await? {
        tokio::fs::remove_file(path).await?;
    }
    Ok(())
}

/// 所有 notebook 分数之和
pub fn total_score(gradebook: &Value) -> f64 {
    gradebook
        .get("notebooks")
        .and_then(Value::as_object)
        .map(|notebooks| notebooks.values().map(notebook_score).sum())
        .unwrap_or(0.0)
}

/// notebook 自带 `score` 时直接使用，否则累加每个 grade 的得分
fn notebook_score(notebook: &Value) -> f64 {
    if let Some(score) = notebook.as_f64() {
        return score;
    }
    if let Some(score) = notebook.get("score").and_then(Value::as_f64) {
        return score;
    }
    notebook
        .get("grades_dict")
        .and_then(Value::as_object)
        .map(|grades| grades.values().map(grade_score).sum())
        .unwrap_or(0.0)
}

// 人工分优先于自动分，额外加分单独累加
fn grade_score(grade: &Value) -> f64 {
    let base = grade
        .get("manual_score")
        .and_then(Value::as_f64)
        .or_else(|| grade.get("auto_score").and_then(Value::as_f64))
        .unwrap_or(0.0);
    let extra = grade
        .get("extra_credit")
        .and_then(Value::as_f64)
        .unwrap_or(0.0);
    base + extra
}
