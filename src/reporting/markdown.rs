//! # Markdown Reporting Module / Markdown 报告模块
//!
//! The narrative document: summary table, overall verdict, failed tests in
//! detail, passed and skipped listings, a configuration echo and, when history
//! is available, a trend section.
//!
//! 叙述性文档：摘要表、总体结论、失败测试的详细信息、通过和跳过的列表、
//! 配置回显，以及（有历史数据时）趋势部分。

use serde_json::json;
use std::fmt::Write;

use crate::core::models::RunReport;
use crate::infra::t;
use crate::reporting::format::{StatusBand, format_duration};
use crate::reporting::history::{RunHistory, Trend, TrendAnalysis};

/// Runs shown in the trend table.
/// 趋势表中显示的运行数量。
pub const TREND_TABLE_LEN: usize = 10;

/// Renders `report` as a Markdown document. `history` adds the trend section
/// when it holds more than one run.
///
/// 将 `report` 渲染为 Markdown 文档。当 `history` 包含多于一次运行时添加趋势部分。
pub fn render_markdown(report: &RunReport, history: Option<&RunHistory>, locale: &str) -> String {
    let mut md = String::new();
    let summary = &report.summary;

    // `write!` into a String cannot fail.
    let _ = writeln!(md, "# 🤖 {}\n", t!("report.title", locale = locale));
    let _ = writeln!(
        md,
        "**{}:** {}\n",
        t!("report.generated", locale = locale),
        report.end_time.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(
        md,
        "**{}:** {}\n",
        t!("report.duration", locale = locale),
        format_duration(report.duration)
    );
    md.push_str("---\n\n");

    let _ = writeln!(md, "## 📊 {}\n", t!("report.summary", locale = locale));
    let _ = writeln!(
        md,
        "| {} | {} |",
        t!("report.metric", locale = locale),
        t!("report.value", locale = locale)
    );
    md.push_str("|--------|-------|\n");
    let rows = [
        (t!("report.total", locale = locale).to_string(), summary.total.to_string()),
        (format!("✅ {}", t!("report.passed", locale = locale)), summary.passed.to_string()),
        (format!("❌ {}", t!("report.failed", locale = locale)), summary.failed.to_string()),
        (format!("⏭️ {}", t!("report.skipped", locale = locale)), summary.skipped.to_string()),
        (
            t!("report.success_rate", locale = locale).to_string(),
            format!("{:.2}%", summary.success_rate),
        ),
        (
            t!("report.avg_duration", locale = locale).to_string(),
            format_duration(summary.avg_duration),
        ),
        (
            t!("report.total_duration", locale = locale).to_string(),
            format_duration(summary.total_duration),
        ),
    ];
    for (label, value) in rows {
        let _ = writeln!(md, "| {label} | {value} |");
    }
    md.push('\n');

    let band = StatusBand::from_rate(summary.success_rate);
    let _ = writeln!(
        md,
        "**{}:** {} {}\n",
        t!("report.overall_status", locale = locale),
        band.emoji(),
        band.label(locale)
    );

    let _ = writeln!(md, "## 📝 {}\n", t!("report.detailed_results", locale = locale));

    let failed: Vec<_> = report.failed_results().collect();
    if !failed.is_empty() {
        let _ = writeln!(md, "### ❌ {}\n", t!("report.failed_tests", locale = locale));
        for (i, result) in failed.iter().enumerate() {
            let _ = writeln!(md, "#### {}. {}", i + 1, result.module_name);
            let _ = writeln!(
                md,
                "- **{}:** `{}`",
                t!("report.module_id", locale = locale),
                result.module_id
            );
            let _ = writeln!(
                md,
                "- **{}:** {}",
                t!("report.duration", locale = locale),
                format_duration(result.duration)
            );
            let unknown = t!("report.unknown_error", locale = locale);
            let _ = writeln!(
                md,
                "- **{}:** {}",
                t!("report.error", locale = locale),
                result.error.as_deref().unwrap_or(&unknown)
            );
            if let Some(screenshot) = &result.screenshot {
                let _ = writeln!(md, "- **{}:** `{screenshot}`", t!("report.screenshot", locale = locale));
            }
            if let Some(details) = &result.details {
                let pretty = serde_json::to_string_pretty(details).unwrap_or_default();
                let _ = writeln!(md, "- **{}:**", t!("report.details", locale = locale));
                md.push_str("  ```json\n");
                for line in pretty.lines() {
                    let _ = writeln!(md, "  {line}");
                }
                md.push_str("  ```\n");
            }
            md.push('\n');
        }
    }

    let passed: Vec<_> = report.passed_results().collect();
    if !passed.is_empty() {
        let _ = writeln!(md, "### ✅ {}\n", t!("report.passed_tests", locale = locale));
        let _ = writeln!(
            md,
            "| # | {} | {} |",
            t!("report.module", locale = locale),
            t!("report.duration", locale = locale)
        );
        md.push_str("|---|--------|----------|\n");
        for (i, result) in passed.iter().enumerate() {
            let _ = writeln!(
                md,
                "| {} | {} | {} |",
                i + 1,
                result.module_name,
                format_duration(result.duration)
            );
        }
        md.push('\n');
    }

    let skipped: Vec<_> = report.skipped_results().collect();
    if !skipped.is_empty() {
        let _ = writeln!(md, "### ⏭️ {}\n", t!("report.skipped_tests", locale = locale));
        for (i, result) in skipped.iter().enumerate() {
            let _ = writeln!(md, "{}. {} - `{}`", i + 1, result.module_name, result.module_id);
        }
        md.push('\n');
    }

    let _ = writeln!(md, "## ⚙️ {}\n", t!("report.configuration", locale = locale));
    let config_echo = json!({
        "baseUrl": report.config.base_url,
        "headless": report.config.headless,
        "retryAttempts": report.config.max_retries,
        "timeout": report.config.timeout_ms,
        "screenshot": report.config.screenshot_on_failure,
    });
    md.push_str("```json\n");
    md.push_str(&serde_json::to_string_pretty(&config_echo).unwrap_or_default());
    md.push_str("\n```\n\n");

    if let Some(history) = history.filter(|h| h.len() > 1) {
        let _ = writeln!(md, "## 📈 {}\n", t!("report.trend_analysis", locale = locale));
        md.push_str(&render_trend(history, locale));
    }

    md.push_str("---\n");
    let _ = writeln!(
        md,
        "*{} {} v{}*",
        t!("report.generated_by", locale = locale),
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
    md
}

/// The trend table over the most recent runs, followed by the trend line.
/// 最近几次运行的趋势表，后接趋势行。
pub fn render_trend(history: &RunHistory, locale: &str) -> String {
    let mut md = String::new();
    let analysis = history.trend();
    let TrendAnalysis::Computed { trend, .. } = analysis else {
        let _ = writeln!(md, "{}\n", t!("report.trend_not_enough", locale = locale));
        return md;
    };

    let _ = writeln!(
        md,
        "| {} | {} | {} | {} | {} |",
        t!("report.run", locale = locale),
        t!("report.date", locale = locale),
        t!("report.passed", locale = locale),
        t!("report.failed", locale = locale),
        t!("report.success_rate", locale = locale)
    );
    md.push_str("|-----|------|--------|--------|--------------|\n");
    for (i, entry) in history.recent(TREND_TABLE_LEN).iter().enumerate() {
        let _ = writeln!(
            md,
            "| {} | {} | {} | {} | {:.1}% |",
            i + 1,
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.summary.passed,
            entry.summary.failed,
            entry.summary.success_rate
        );
    }
    md.push('\n');

    let trend_label = match trend {
        Trend::Improving => format!("📈 {}", t!("report.trend_improving", locale = locale)),
        Trend::Declining => format!("📉 {}", t!("report.trend_declining", locale = locale)),
        Trend::Stable => format!("➡️ {}", t!("report.trend_stable", locale = locale)),
    };
    let delta = analysis.delta_label().unwrap_or_default();
    let _ = writeln!(
        md,
        "**{}:** {trend_label} ({delta}%)\n",
        t!("report.trend", locale = locale)
    );
    md
}
