//! # HTML Reporting Module / HTML 报告模块
//!
//! This module renders the visual dashboard: a self-contained page with metric
//! cards, a progress bar coloured by the run's status band and one card per
//! result.
//!
//! 此模块渲染可视化仪表板：一个自包含页面，包含指标卡片、按运行状态等级着色的
//! 进度条，以及每个结果的卡片。

use maud::{DOCTYPE, Markup, PreEscaped, html};

use crate::core::models::{ExecutionResult, RunReport};
use crate::infra::t;
use crate::reporting::format::{StatusBand, escape_html, format_duration};

/// Embedded CSS styles for HTML reports / HTML 报告的嵌入式 CSS 样式
const HTML_STYLE: &str = include_str!("assets/report.css");

/// Renders `report` as a complete HTML page.
///
/// Every string that comes from a module (names, ids, errors, screenshot
/// paths) goes through [`escape_html`].
///
/// 将 `report` 渲染为完整的 HTML 页面。
/// 所有来自模块的字符串（名称、id、错误、截图路径）都经过 [`escape_html`] 处理。
pub fn render_html(report: &RunReport, locale: &str) -> String {
    let summary = &report.summary;
    let band = StatusBand::from_rate(summary.success_rate);
    let title = t!("report.title", locale = locale).to_string();

    let metrics = [
        (summary.total.to_string(), "", t!("report.total", locale = locale).to_string()),
        (summary.passed.to_string(), "passed", t!("report.passed", locale = locale).to_string()),
        (summary.failed.to_string(), "failed", t!("report.failed", locale = locale).to_string()),
        (summary.skipped.to_string(), "skipped", t!("report.skipped", locale = locale).to_string()),
        (
            format!("{:.1}%", summary.success_rate),
            "",
            t!("report.success_rate", locale = locale).to_string(),
        ),
        (
            format_duration(summary.avg_duration),
            "",
            t!("report.avg_duration", locale = locale).to_string(),
        ),
    ];

    let page = html! {
        (DOCTYPE)
        html lang=(locale) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " - " (report.end_time.format("%Y-%m-%d").to_string()) }
                style { (PreEscaped(HTML_STYLE)) }
            }
            body style=(format!("--status-color: {};", band.color())) {
                div class="container" {
                    div class="header" {
                        h1 { "🤖 " (title) }
                        p {
                            (t!("report.generated", locale = locale).to_string()) ": "
                            (report.end_time.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                        }
                        p {
                            (t!("report.duration", locale = locale).to_string()) ": "
                            (format_duration(report.duration))
                        }
                    }

                    div class="summary" {
                        @for (value, class, label) in &metrics {
                            div class="metric" {
                                div class={ "metric-value " (class) } { (value) }
                                div class="metric-label" { (label) }
                            }
                        }
                    }

                    div class="progress-bar" {
                        div class="progress-fill"
                            style=(format!("width: {:.2}%", summary.success_rate.clamp(0.0, 100.0))) {}
                    }

                    div class="results" {
                        h2 { "📝 " (t!("report.test_results", locale = locale).to_string()) }
                        @for result in &report.results {
                            (result_card(result, locale))
                        }
                    }

                    div class="footer" {
                        p {
                            (t!("report.generated_by", locale = locale).to_string()) " "
                            (env!("CARGO_PKG_NAME")) " v" (env!("CARGO_PKG_VERSION"))
                        }
                    }
                }
            }
        }
    };
    page.into_string()
}

fn result_card(result: &ExecutionResult, locale: &str) -> Markup {
    let status = result.status.as_str();
    html! {
        div class={ "result-item " (status) } {
            div class="result-header" {
                div class="result-name" { (PreEscaped(escape_html(&result.module_name))) }
                div {
                    span class={ "status-badge " (status) } { (status) }
                    " "
                    span class="result-duration" { (format_duration(result.duration)) }
                }
            }
            div class="result-id" { (PreEscaped(escape_html(&result.module_id))) }
            @if let Some(message) = &result.error {
                @if result.is_failure() {
                    div class="result-error" { (PreEscaped(escape_html(message))) }
                } @else {
                    div class="result-note" { (PreEscaped(escape_html(message))) }
                }
            }
            @if let Some(screenshot) = &result.screenshot {
                div class="result-screenshot" {
                    a href=(PreEscaped(escape_html(screenshot))) target="_blank" {
                        "📸 " (t!("report.view_screenshot", locale = locale).to_string())
                    }
                }
            }
        }
    }
}
