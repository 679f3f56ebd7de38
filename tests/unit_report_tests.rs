//! # Reporting Unit Tests / 报告单元测试
//!
//! Formatting helpers, run history and trend analysis, the renderers and the
//! report generator's output handling.
//!
//! 格式化辅助、运行历史与趋势分析、各渲染器以及报告生成器的输出处理。

mod common;

use bot_runner::config::ReportingConfig;
use bot_runner::core::ModuleOutcome;
use bot_runner::reporting::format::{StatusBand, escape_html, format_duration};
use bot_runner::reporting::history::HISTORY_CAPACITY;
use bot_runner::reporting::{
    HistoryEntry, ReportFormat, ReportGenerator, RunHistory, Trend, TrendAnalysis, render_html,
    render_json, render_markdown,
};
use chrono::Utc;
use common::{report_of, report_with_rate, result};
use std::time::Duration;
use tempfile::tempdir;

fn in_memory(formats: Vec<ReportFormat>) -> ReportGenerator {
    ReportGenerator::new(&ReportingConfig {
        output_dir: None,
        formats,
        historical_comparison: true,
    })
}

#[cfg(test)]
mod format_tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(850)), "850ms");
        assert_eq!(format_duration(Duration::from_millis(12_340)), "12.34s");
        assert_eq!(format_duration(Duration::from_millis(187_000)), "3m 7s");
    }

    #[test]
    fn test_format_duration_rounds_across_unit_boundaries() {
        assert_eq!(format_duration(Duration::from_millis(1_000)), "1.00s");
        assert_eq!(format_duration(Duration::from_millis(59_994)), "59.99s");
        assert_eq!(format_duration(Duration::from_millis(59_999)), "1m 0s");
        assert_eq!(format_duration(Duration::from_millis(119_600)), "2m 0s");
        assert_eq!(format_duration(Duration::from_millis(119_400)), "1m 59s");
    }

    #[test]
    fn test_status_bands() {
        assert_eq!(StatusBand::from_rate(100.0), StatusBand::Perfect);
        assert_eq!(StatusBand::from_rate(95.0), StatusBand::Excellent);
        assert_eq!(StatusBand::from_rate(80.0), StatusBand::Good);
        assert_eq!(StatusBand::from_rate(70.0), StatusBand::Fair);
        assert_eq!(StatusBand::from_rate(50.0), StatusBand::NeedsAttention);
        assert_eq!(StatusBand::from_rate(49.9), StatusBand::Critical);
        assert_eq!(StatusBand::from_rate(0.0).label("en"), "Critical");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#039;Jerry&#039;&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }
}

#[cfg(test)]
mod history_tests {
    use super::*;

    #[test]
    fn test_single_run_has_no_trend() {
        let mut history = RunHistory::new();
        history.push(HistoryEntry::from(&report_with_rate(8)));

        assert_eq!(history.trend(), TrendAnalysis::NotEnoughData);
        assert_eq!(history.trend().delta_label(), None);
    }

    #[test]
    fn test_improving_trend() {
        let mut history = RunHistory::new();
        history.push(HistoryEntry::from(&report_with_rate(8)));
        history.push(HistoryEntry::from(&report_with_rate(9)));

        let analysis = history.trend();
        let TrendAnalysis::Computed { trend, delta } = analysis else {
            panic!("expected a computed trend");
        };
        assert_eq!(trend, Trend::Improving);
        assert!((delta - 10.0).abs() < 1e-9);
        assert_eq!(analysis.delta_label().as_deref(), Some("+10.00"));
    }

    #[test]
    fn test_declining_and_stable_trends() {
        let mut history = RunHistory::new();
        history.push(HistoryEntry::from(&report_with_rate(9)));
        history.push(HistoryEntry::from(&report_with_rate(6)));
        assert!(matches!(
            history.trend(),
            TrendAnalysis::Computed { trend: Trend::Declining, .. }
        ));
        assert_eq!(history.trend().delta_label().as_deref(), Some("-30.00"));

        history.push(HistoryEntry::from(&report_with_rate(6)));
        assert!(matches!(
            history.trend(),
            TrendAnalysis::Computed { trend: Trend::Stable, .. }
        ));
    }

    #[test]
    fn test_history_is_capped() {
        let mut history = RunHistory::new();
        for passed in 0..(HISTORY_CAPACITY + 5) {
            history.push(HistoryEntry::from(&report_with_rate(passed % 11)));
        }

        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.recent(3).len(), 3);
        // The five oldest entries were evicted.
        let oldest = history.entries().next().unwrap();
        assert_eq!(oldest.summary.passed, 5);
    }
}

#[cfg(test)]
mod renderer_tests {
    use super::*;

    #[test]
    fn test_json_snapshot_contains_report_and_metadata() {
        let report = report_of(vec![result("health", ModuleOutcome::success(), 120)]);
        let mut history = RunHistory::new();
        history.push(HistoryEntry::from(&report));

        let text = render_json(&report, Some(history.recent(5)), Utc::now()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["summary"]["total"], 1);
        assert_eq!(value["results"][0]["moduleId"], "health");
        assert_eq!(value["metadata"]["generator"], "bot-runner");
        assert_eq!(value["history"].as_array().unwrap().len(), 1);

        let without = render_json(&report, None, Utc::now()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&without).unwrap();
        assert!(value.get("history").is_none());
    }

    #[test]
    fn test_html_escapes_module_text() {
        let report = report_of(vec![result(
            "xss",
            ModuleOutcome::failed("<script>alert(1)</script>"),
            10,
        )]);
        let html = render_html(&report, "en");

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("Bot Runner Test Report"));
    }

    #[test]
    fn test_html_skip_reason_is_not_styled_as_error() {
        let report = report_of(vec![
            result("legacy", ModuleOutcome::skipped("disabled in config"), 0),
            result("login", ModuleOutcome::failed("bad password"), 300),
        ]);
        let html = render_html(&report, "en");

        assert!(html.contains(r#"<div class="result-note">disabled in config</div>"#));
        assert!(html.contains(r#"<div class="result-error">bad password</div>"#));
        assert!(!html.contains(r#"<div class="result-error">disabled in config</div>"#));
    }

    #[test]
    fn test_markdown_sections() {
        let report = report_of(vec![
            result("login", ModuleOutcome::failed("bad password"), 300),
            result("health", ModuleOutcome::success(), 100),
            result("legacy", ModuleOutcome::skipped("disabled"), 0),
        ]);
        let md = render_markdown(&report, None, "en");

        assert!(md.contains("# 🤖 Bot Runner Test Report"));
        assert!(md.contains("| Total | 3 |"));
        assert!(md.contains("### ❌ Failed Tests"));
        assert!(md.contains("- **Error:** bad password"));
        assert!(md.contains("### ✅ Passed Tests"));
        assert!(md.contains("1. LEGACY - `legacy`"));
        assert!(!md.contains("Trend Analysis"));
    }

    #[test]
    fn test_markdown_trend_section() {
        let mut history = RunHistory::new();
        history.push(HistoryEntry::from(&report_with_rate(8)));
        let latest = report_with_rate(9);
        history.push(HistoryEntry::from(&latest));

        let md = render_markdown(&latest, Some(&history), "en");

        assert!(md.contains("## 📈 Trend Analysis"));
        assert!(md.contains("📈 Improving (+10.00%)"));
    }

    #[test]
    fn test_markdown_is_localized() {
        let report = report_with_rate(10);
        let md = render_markdown(&report, None, "zh-CN");
        assert!(!md.contains("Bot Runner Test Report"));
    }
}

#[cfg(test)]
mod generator_tests {
    use super::*;

    #[test]
    fn test_without_output_dir_content_is_returned() {
        let mut generator = in_memory(vec![ReportFormat::Json, ReportFormat::Markdown]);
        let generated = generator.generate_reports(&report_with_rate(10));

        assert_eq!(generated.len(), 2);
        for report in &generated {
            assert!(report.success);
            assert!(report.path.is_none());
            assert!(report.content.as_deref().is_some_and(|c| !c.is_empty()));
        }
        assert_eq!(generator.history().len(), 1);
    }

    #[test]
    fn test_console_is_never_written() {
        let dir = tempdir().unwrap();
        let mut generator = ReportGenerator::new(&ReportingConfig {
            output_dir: Some(dir.path().to_path_buf()),
            formats: vec![ReportFormat::Console],
            historical_comparison: false,
        });
        let generated = generator.generate_reports(&report_with_rate(7));

        assert!(generated[0].success);
        assert!(generated[0].path.is_none());
        assert!(generated[0].content.as_deref().unwrap().contains("BOT RUNNER - TEST REPORT"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_files_are_written_to_output_dir() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("nested").join("reports");
        let mut generator = ReportGenerator::new(&ReportingConfig {
            output_dir: Some(output.clone()),
            formats: vec![ReportFormat::Json, ReportFormat::Markdown, ReportFormat::Html],
            historical_comparison: true,
        });

        let generated = generator.generate_reports(&report_with_rate(9));

        assert!(generated.iter().all(|r| r.success));
        let mut extensions = Vec::new();
        for report in &generated {
            let path = report.path.as_ref().unwrap();
            assert!(path.starts_with(&output));
            assert!(path.exists());
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            assert!(name.starts_with("test-report-"));
            assert!(!name.contains(':'));
            extensions.push(path.extension().unwrap().to_string_lossy().to_string());
        }
        assert_eq!(extensions, vec!["json", "md", "html"]);
    }

    #[test]
    fn test_unusable_output_dir_fails_each_file_format() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();
        let mut generator = ReportGenerator::new(&ReportingConfig {
            output_dir: Some(blocker.join("reports")),
            formats: vec![ReportFormat::Json, ReportFormat::Html, ReportFormat::Console],
            historical_comparison: false,
        });

        let generated = generator.generate_reports(&report_with_rate(5));

        assert!(!generated[0].success);
        assert!(generated[0].error.is_some());
        assert!(!generated[1].success);
        assert!(generated[2].success);
    }

    #[test]
    fn test_generator_tracks_trend_across_runs() {
        let mut generator = in_memory(vec![ReportFormat::Json]);
        generator.generate_reports(&report_with_rate(8));
        assert_eq!(generator.trend(), TrendAnalysis::NotEnoughData);

        let generated = generator.generate_reports(&report_with_rate(6));
        let value: serde_json::Value =
            serde_json::from_str(generated[0].content.as_deref().unwrap()).unwrap();
        assert_eq!(value["history"].as_array().unwrap().len(), 2);
        assert!(matches!(
            generator.trend(),
            TrendAnalysis::Computed { trend: Trend::Declining, .. }
        ));

        generator.clear_history();
        assert!(generator.history().is_empty());
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("md".parse::<ReportFormat>().unwrap(), ReportFormat::Markdown);
        assert_eq!("Terminal".parse::<ReportFormat>().unwrap(), ReportFormat::Console);
        assert!("pdf".parse::<ReportFormat>().is_err());
        assert_eq!(ReportFormat::Console.extension(), None);
    }
}
