//! 自动评分输出的文件白名单

use std::path::Path;

use glob::{MatchOptions, Pattern};
use walkdir::WalkDir;

use crate::errors::Result;
use crate::models::assignments::entities::AssignmentSettings;

pub const NOTEBOOK_PATTERN: &str = "*.ipynb";

/// `{"*.ipynb"} ∪ allowed_files ∪ extra_files`，保持顺序并去重
pub fn compute_whitelist(settings: &AssignmentSettings) -> Vec<String> {
    let mut patterns = vec![NOTEBOOK_PATTERN.to_string()];
    for pattern in settings
        .allowed_files
        .iter()
        .chain(settings.extra_files.iter())
    {
        if !patterns.contains(pattern) {
            patterns.push(pattern.clone());
        }
    }
    patterns
}

/// 遍历输出目录（跳过 `.git`），返回匹配任一模式的相对路径，按路径排序
///
/// `*` 可以跨越 `/`，因此 `*.py` 也会匹配 `sub/a.py`。
pub fn files_to_commit(output_dir: &Path, patterns: &[String]) -> Result<Vec<String>> {
    let compiled = patterns
        .iter()
        .map(|p| Pattern::new(p))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let options = MatchOptions::new();

    let mut files = Vec::new();
    let walker = WalkDir::new(output_dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git");
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(output_dir) else {
            continue;
        };
        let relative = relative.to_string_lossy().replace('\\', "/");
        if compiled.iter().any(|p| p.matches_with(&relative, options)) {
            files.push(relative);
        }
    }
    files.sort();
    Ok(files)
}
