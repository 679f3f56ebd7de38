//! # Data Models Module / 数据模型模块
//!
//! This module defines the core data structures shared by the engine, the runner
//! and the report generator: module outcomes, execution results, run summaries,
//! run reports and module filters.
//!
//! 此模块定义了引擎、运行器和报告生成器共享的核心数据结构：
//! 模块结果、执行结果、运行摘要、运行报告和模块过滤器。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::core::config::RunnerConfig;

/// The terminal status of a module execution.
/// 模块执行的最终状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleStatus {
    /// The module completed and all of its checks passed.
    /// 模块已完成且所有检查均通过。
    Success,
    /// The module reported a failure or returned an error.
    /// 模块报告失败或返回错误。
    Failed,
    /// The module decided not to run (or is disabled).
    /// 模块决定不运行（或已禁用）。
    Skipped,
}

impl ModuleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleStatus::Success => "success",
            ModuleStatus::Failed => "failed",
            ModuleStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a module's `execute` returns for a single attempt.
/// The engine stamps identity, timing and attempt count on top of it
/// to produce an [`ExecutionResult`].
///
/// 模块的 `execute` 在单次尝试中返回的内容。
/// 引擎会在其基础上加上标识、计时和尝试次数，生成 [`ExecutionResult`]。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleOutcome {
    pub status: ModuleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
}

impl ModuleOutcome {
    pub fn success() -> Self {
        Self {
            status: ModuleStatus::Success,
            error: None,
            details: None,
            screenshot: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: ModuleStatus::Failed,
            error: Some(error.into()),
            details: None,
            screenshot: None,
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            status: ModuleStatus::Skipped,
            error: Some(reason.into()),
            details: None,
            screenshot: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_screenshot(mut self, screenshot: impl Into<String>) -> Self {
        self.screenshot = Some(screenshot.into());
        self
    }
}

/// Serializes a `Duration` as whole milliseconds.
/// 将 `Duration` 序列化为整数毫秒。
pub(crate) mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// The final, terminal result of executing one module (retries included).
/// Results observed outside the engine are always in a terminal state.
///
/// 执行一个模块（包括重试）的最终结果。
/// 在引擎外部观察到的结果始终处于终止状态。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub module_id: String,
    pub module_name: String,
    pub status: ModuleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    /// How many attempts the retry loop made (0 for synthetic results).
    /// 重试循环进行的尝试次数（合成结果为 0）。
    #[serde(default)]
    pub attempts: u32,
}

impl ExecutionResult {
    /// Builds a result from a module outcome.
    pub fn from_outcome(
        module_id: &str,
        module_name: &str,
        outcome: ModuleOutcome,
        duration: Duration,
        attempts: u32,
    ) -> Self {
        Self {
            module_id: module_id.to_string(),
            module_name: module_name.to_string(),
            status: outcome.status,
            error: outcome.error,
            details: outcome.details,
            screenshot: outcome.screenshot,
            timestamp: Utc::now(),
            duration,
            attempts,
        }
    }

    /// A failed result that was never produced by a module, e.g. for an unknown id
    /// or an aborted suite.
    ///
    /// 并非由模块产生的失败结果，例如未知 id 或中止的套件。
    pub fn synthetic_failure(module_id: &str, module_name: &str, error: impl Into<String>) -> Self {
        Self::from_outcome(
            module_id,
            module_name,
            ModuleOutcome::failed(error),
            Duration::ZERO,
            0,
        )
    }

    pub fn is_failure(&self) -> bool {
        self.status == ModuleStatus::Failed
    }

    pub fn is_success(&self) -> bool {
        self.status == ModuleStatus::Success
    }

    pub fn is_skipped(&self) -> bool {
        self.status == ModuleStatus::Skipped
    }
}

/// Aggregate statistics over a set of results.
/// 一组结果的汇总统计。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Percentage in `[0, 100]`. Zero when there are no results.
    /// 百分比，范围 `[0, 100]`。没有结果时为 0。
    pub success_rate: f64,
    #[serde(with = "duration_ms")]
    pub avg_duration: Duration,
    #[serde(with = "duration_ms")]
    pub total_duration: Duration,
}

impl Summary {
    /// Computes the summary of `results`. Pure; never divides by zero.
    ///
    /// 计算 `results` 的摘要。纯函数；不会除以零。
    pub fn from_results(results: &[ExecutionResult]) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.is_success()).count();
        let failed = results.iter().filter(|r| r.is_failure()).count();
        let skipped = results.iter().filter(|r| r.is_skipped()).count();
        let total_duration: Duration = results.iter().map(|r| r.duration).sum();

        let (success_rate, avg_duration) = if total == 0 {
            (0.0, Duration::ZERO)
        } else {
            (
                passed as f64 * 100.0 / total as f64,
                total_duration / total as u32,
            )
        };

        Self {
            total,
            passed,
            failed,
            skipped,
            success_rate,
            avg_duration,
            total_duration,
        }
    }
}

impl Default for Summary {
    fn default() -> Self {
        Self::from_results(&[])
    }
}

/// Inclusion and exclusion sets over module id, tag and category.
/// Empty lists place no constraint. Exclusions are applied after inclusions.
///
/// 基于模块 id、标签和类别的包含与排除集合。
/// 空列表不施加约束。排除在包含之后应用。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestFilter {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub module_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_module_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_tags: Vec<String>,
}

impl TestFilter {
    /// True when the filter constrains nothing.
    pub fn is_empty(&self) -> bool {
        self.module_ids.is_empty()
            && self.tags.is_empty()
            && self.categories.is_empty()
            && self.exclude_module_ids.is_empty()
            && self.exclude_tags.is_empty()
    }
}

/// How the modules of a suite are scheduled.
/// 套件中模块的调度方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionMode {
    /// Strict list order, one at a time. / 严格按列表顺序逐个执行。
    #[default]
    Sequential,
    /// Everything at once; results in input order. / 全部并发；结果按输入顺序。
    Parallel,
    /// Bounded pool; results in completion order. / 有界并发池；结果按完成顺序。
    LimitedParallel,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Sequential => "sequential",
            ExecutionMode::Parallel => "parallel",
            ExecutionMode::LimitedParallel => "limited-parallel",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(ExecutionMode::Sequential),
            "parallel" => Ok(ExecutionMode::Parallel),
            "limited-parallel" | "limited_parallel" | "limited" => {
                Ok(ExecutionMode::LimitedParallel)
            }
            other => anyhow::bail!("Unknown execution mode: {other}"),
        }
    }
}

/// The single report produced by one invocation of the test runner.
/// 测试运行器一次调用产生的唯一报告。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub summary: Summary,
    pub results: Vec<ExecutionResult>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    pub config: RunnerConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<TestFilter>,
}

impl RunReport {
    pub fn failed_results(&self) -> impl Iterator<Item = &ExecutionResult> {
        self.results.iter().filter(|r| r.is_failure())
    }

    pub fn passed_results(&self) -> impl Iterator<Item = &ExecutionResult> {
        self.results.iter().filter(|r| r.is_success())
    }

    pub fn skipped_results(&self) -> impl Iterator<Item = &ExecutionResult> {
        self.results.iter().filter(|r| r.is_skipped())
    }

    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0
    }
}
