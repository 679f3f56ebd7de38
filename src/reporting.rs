//! # Reporting Module / 报告模块
//!
//! This module turns a [`RunReport`](crate::core::models::RunReport) into output
//! artifacts: a JSON snapshot, a Markdown document, an HTML dashboard and a
//! colored terminal rendering. It also keeps the run history used for trend
//! analysis.
//!
//! 此模块将运行报告转换为输出产物：JSON 快照、Markdown 文档、HTML 仪表板和彩色终端输出。
//! 它还保存用于趋势分析的运行历史。

pub mod console;
pub mod format;
pub mod generator;
pub mod history;
pub mod html;
pub mod json;
pub mod markdown;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub use console::render_console;
pub use generator::ReportGenerator;
pub use history::{HistoryEntry, RunHistory, Trend, TrendAnalysis};
pub use html::render_html;
pub use json::render_json;
pub use markdown::render_markdown;

/// An output format of the report generator.
/// 报告生成器的输出格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Json,
    Markdown,
    Html,
    /// Rendered to the terminal only; never written to a file.
    /// 仅渲染到终端，从不写入文件。
    Console,
}

impl ReportFormat {
    pub const ALL: [ReportFormat; 4] = [
        ReportFormat::Json,
        ReportFormat::Markdown,
        ReportFormat::Html,
        ReportFormat::Console,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Markdown => "markdown",
            ReportFormat::Html => "html",
            ReportFormat::Console => "console",
        }
    }

    /// File extension, or `None` for formats that are not written to disk.
    /// 文件扩展名；不写入磁盘的格式返回 `None`。
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            ReportFormat::Json => Some("json"),
            ReportFormat::Markdown => Some("md"),
            ReportFormat::Html => Some("html"),
            ReportFormat::Console => None,
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            "html" => Ok(ReportFormat::Html),
            "console" | "terminal" => Ok(ReportFormat::Console),
            other => anyhow::bail!("Unknown report format: {other}"),
        }
    }
}

/// The outcome of generating one format.
///
/// File formats carry `path` when written to an output directory, otherwise
/// the rendered text in `content`. A failed format carries `error`.
///
/// 生成单个格式的结果。写入输出目录时文件格式携带 `path`，否则在 `content` 中携带渲染文本。
/// 失败的格式携带 `error`。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedReport {
    pub format: ReportFormat,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GeneratedReport {
    pub fn written(format: ReportFormat, path: PathBuf) -> Self {
        Self {
            format,
            success: true,
            path: Some(path),
            content: None,
            error: None,
        }
    }

    pub fn rendered(format: ReportFormat, content: String) -> Self {
        Self {
            format,
            success: true,
            path: None,
            content: Some(content),
            error: None,
        }
    }

    pub fn failed(format: ReportFormat, error: impl Into<String>) -> Self {
        Self {
            format,
            success: false,
            path: None,
            content: None,
            error: Some(error.into()),
        }
    }
}
