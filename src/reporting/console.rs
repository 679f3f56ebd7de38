//! # Console Reporting Module / 控制台报告模块
//!
//! This module renders the terminal summary of a run: a banner, the summary
//! block, the overall status, failed test details and the passed test listing.
//!
//! 此模块渲染一次运行的终端摘要：横幅、摘要块、总体状态、失败测试详情和通过测试列表。

use colored::*;
use std::fmt::Write;

use crate::core::models::RunReport;
use crate::infra::t;
use crate::reporting::format::{StatusBand, format_duration};

/// Renders the terminal summary of `report`.
///
/// # Output Format / 输出格式
/// ```text
/// ================================================================================
/// BOT RUNNER - TEST REPORT
/// ================================================================================
///
/// SUMMARY:
///   Total:        3
///   ✅ Passed:    2
///   ...
/// ⚠️ Overall Status: Needs Attention
/// ```
pub fn render_console(report: &RunReport, locale: &str) -> String {
    let summary = &report.summary;
    let rule = "=".repeat(80);
    let mut out = String::new();

    let _ = writeln!(out, "\n{rule}");
    let _ = writeln!(out, "{}", t!("console.banner", locale = locale).bold());
    let _ = writeln!(out, "{rule}\n");

    let _ = writeln!(out, "📊 {}", t!("console.summary", locale = locale).bold());
    let lines = [
        (t!("report.total", locale = locale).to_string(), summary.total.to_string().normal()),
        (
            format!("✅ {}", t!("report.passed", locale = locale)),
            summary.passed.to_string().green(),
        ),
        (
            format!("❌ {}", t!("report.failed", locale = locale)),
            summary.failed.to_string().red(),
        ),
        (
            format!("⏭️  {}", t!("report.skipped", locale = locale)),
            summary.skipped.to_string().dimmed(),
        ),
        (
            t!("report.success_rate", locale = locale).to_string(),
            format!("{:.2}%", summary.success_rate).normal(),
        ),
        (
            t!("report.avg_duration", locale = locale).to_string(),
            format_duration(summary.avg_duration).normal(),
        ),
        (
            t!("report.duration", locale = locale).to_string(),
            format_duration(report.duration).normal(),
        ),
    ];
    for (label, value) in lines {
        let _ = writeln!(out, "  {:<16} {value}", format!("{label}:"));
    }
    out.push('\n');

    let band = StatusBand::from_rate(summary.success_rate);
    let status = format!(
        "{} {}: {}",
        band.emoji(),
        t!("report.overall_status", locale = locale),
        band.label(locale)
    );
    let status = match band {
        StatusBand::Perfect => status.green().bold(),
        StatusBand::Excellent | StatusBand::Good => status.yellow().bold(),
        _ => status.red().bold(),
    };
    let _ = writeln!(out, "{status}\n");

    let failed: Vec<_> = report.failed_results().collect();
    if !failed.is_empty() {
        let _ = writeln!(out, "❌ {}", t!("console.failed_tests", locale = locale).red().bold());
        let unknown = t!("report.unknown_error", locale = locale);
        for (i, result) in failed.iter().enumerate() {
            let _ = writeln!(out, "\n  {}. {}", i + 1, result.module_name.cyan());
            let _ = writeln!(
                out,
                "     {}: {}",
                t!("report.module", locale = locale),
                result.module_id
            );
            let _ = writeln!(
                out,
                "     {}: {}",
                t!("report.duration", locale = locale),
                format_duration(result.duration)
            );
            let _ = writeln!(
                out,
                "     {}: {}",
                t!("report.error", locale = locale),
                result.error.as_deref().unwrap_or(&unknown).red()
            );
            if let Some(screenshot) = &result.screenshot {
                let _ = writeln!(
                    out,
                    "     {}: {screenshot}",
                    t!("report.screenshot", locale = locale)
                );
            }
        }
        out.push('\n');
    }

    let passed: Vec<_> = report.passed_results().collect();
    if !passed.is_empty() {
        let _ = writeln!(
            out,
            "✅ {}",
            t!("console.passed_tests", locale = locale, count = passed.len()).green().bold()
        );
        for (i, result) in passed.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {}. {} ({})",
                i + 1,
                result.module_name,
                format_duration(result.duration)
            );
        }
        out.push('\n');
    }

    let _ = writeln!(out, "{rule}");
    out
}
