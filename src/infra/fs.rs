//! # File System Operations Module / 文件系统操作模块
//!
//! Path expansion, report output directories and timestamped artifact names.
//!
//! 路径展开、报告输出目录和带时间戳的产物文件名。

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fs;
use std::path::{Path, PathBuf};

/// Expands `~` and environment variables in `path`.
///
/// # Arguments
/// * `path` - A possibly relative path such as `~/reports` or `$OUT/reports`
///
/// 展开 `path` 中的 `~` 和环境变量。
pub fn expand_path(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)
        .with_context(|| format!("Failed to expand path: {}", path.display()))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Creates `dir` (and its parents) if it does not exist yet.
/// 如果 `dir`（及其父目录）不存在则创建。
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))
}

/// Turns a timestamp into a file-name-safe string: RFC 3339 in UTC with `:`
/// and `.` replaced by `-`.
///
/// 将时间戳转换为可用于文件名的字符串：UTC 的 RFC 3339 格式，并将 `:` 和 `.` 替换为 `-`。
pub fn file_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

/// `test-report-<timestamp>.<extension>`
pub fn report_file_name(at: DateTime<Utc>, extension: &str) -> String {
    format!("test-report-{}.{extension}", file_timestamp(at))
}

/// Writes `content` to `dir/name`, returning the full path.
/// 将 `content` 写入 `dir/name`，并返回完整路径。
pub fn write_artifact(dir: &Path, name: &str, content: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, content)
        .with_context(|| format!("Failed to write report file: {}", path.display()))?;
    Ok(path)
}
