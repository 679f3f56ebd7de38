//! # JSON Reporting Module / JSON 报告模块
//!
//! The machine-readable snapshot: the run report itself plus generator metadata
//! and, when enabled, the most recent history entries.
//!
//! 机器可读的快照：运行报告本身加上生成器元数据，以及（启用时）最近的历史记录。

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::models::RunReport;
use crate::reporting::history::HistoryEntry;

/// History entries embedded in the snapshot.
/// 嵌入快照中的历史记录数量。
pub const SNAPSHOT_HISTORY_LEN: usize = 5;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Metadata {
    generated_at: DateTime<Utc>,
    generator: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct Snapshot<'a> {
    #[serde(flatten)]
    report: &'a RunReport,
    metadata: Metadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    history: Option<Vec<&'a HistoryEntry>>,
}

/// Renders `report` as pretty-printed JSON.
/// 将 `report` 渲染为格式化的 JSON。
pub fn render_json(
    report: &RunReport,
    history: Option<Vec<&HistoryEntry>>,
    generated_at: DateTime<Utc>,
) -> Result<String> {
    let snapshot = Snapshot {
        report,
        metadata: Metadata {
            generated_at,
            generator: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        },
        history,
    };
    serde_json::to_string_pretty(&snapshot).context("Failed to serialize JSON report")
}
