//! # Run History Module / 运行历史模块
//!
//! A bounded, in-memory record of past runs used for trend analysis.
//!
//! 用于趋势分析的有界内存运行记录。

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

use crate::core::models::{ExecutionResult, RunReport, Summary};
use crate::reporting::format::format_delta;

/// Maximum number of runs kept; the oldest is evicted first.
/// 保留的最大运行数；最早的记录最先被淘汰。
pub const HISTORY_CAPACITY: usize = 30;

/// One past run.
/// 一次过去的运行。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub summary: Summary,
    pub results: Vec<ExecutionResult>,
}

impl From<&RunReport> for HistoryEntry {
    fn from(report: &RunReport) -> Self {
        Self {
            timestamp: report.end_time,
            summary: report.summary.clone(),
            results: report.results.clone(),
        }
    }
}

/// Direction of the success rate between the two most recent runs.
/// 最近两次运行之间成功率的变化方向。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrendAnalysis {
    /// Fewer than two runs recorded.
    /// 记录的运行少于两次。
    NotEnoughData,
    Computed {
        trend: Trend,
        /// `latest.success_rate - previous.success_rate`, in percentage points.
        /// 以百分点表示。
        delta: f64,
    },
}

impl TrendAnalysis {
    /// The signed delta with two decimals, e.g. `"+10.00"`.
    /// 带符号、两位小数的差值，例如 `"+10.00"`。
    pub fn delta_label(&self) -> Option<String> {
        match self {
            TrendAnalysis::NotEnoughData => None,
            TrendAnalysis::Computed { delta, .. } => Some(format_delta(*delta)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunHistory {
    entries: VecDeque<HistoryEntry>,
}

impl RunHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > HISTORY_CAPACITY {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// The `count` most recent entries, oldest first.
    /// 最近的 `count` 条记录，最早的在前。
    pub fn recent(&self, count: usize) -> Vec<&HistoryEntry> {
        let skip = self.entries.len().saturating_sub(count);
        self.entries.iter().skip(skip).collect()
    }

    pub fn trend(&self) -> TrendAnalysis {
        let recent = self.recent(2);
        let [previous, latest] = recent.as_slice() else {
            return TrendAnalysis::NotEnoughData;
        };
        let delta = latest.summary.success_rate - previous.summary.success_rate;
        let trend = if delta > 0.0 {
            Trend::Improving
        } else if delta < 0.0 {
            Trend::Declining
        } else {
            Trend::Stable
        };
        TrendAnalysis::Computed { trend, delta }
    }
}
