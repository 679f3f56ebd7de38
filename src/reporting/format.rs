//! # Report Formatting Helpers / 报告格式化辅助
//!
//! Small pieces shared by every renderer: duration formatting, status bands,
//! and markup escaping.
//!
//! 所有渲染器共享的小工具：时长格式化、状态等级和标记转义。

use std::time::Duration;

use crate::infra::t;

/// Formats a duration for humans: `"850ms"`, `"12.34s"` or `"3m 7s"`.
/// 以易读方式格式化时长：`"850ms"`、`"12.34s"` 或 `"3m 7s"`。
pub fn format_duration(duration: Duration) -> String {
    let ms = duration.as_millis();
    if ms < 1_000 {
        return format!("{ms}ms");
    }
    // Round first so a value like 59_999ms never prints as "60.00s" or "1m 60s".
    let centis = (ms + 5) / 10;
    if centis < 6_000 {
        format!("{}.{:02}s", centis / 100, centis % 100)
    } else {
        let secs = (ms + 500) / 1_000;
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Formats a signed percentage-point delta with two decimals; positive values get a `+`.
/// 以两位小数格式化带符号的百分点差值；正值带 `+` 号。
pub fn format_delta(delta: f64) -> String {
    if delta > 0.0 {
        format!("+{delta:.2}")
    } else {
        format!("{delta:.2}")
    }
}

/// Overall verdict of a run, derived from its success rate.
/// 根据成功率得出的运行总体结论。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusBand {
    Perfect,
    Excellent,
    Good,
    Fair,
    NeedsAttention,
    Critical,
}

impl StatusBand {
    pub fn from_rate(success_rate: f64) -> Self {
        if success_rate >= 100.0 {
            StatusBand::Perfect
        } else if success_rate >= 90.0 {
            StatusBand::Excellent
        } else if success_rate >= 80.0 {
            StatusBand::Good
        } else if success_rate >= 70.0 {
            StatusBand::Fair
        } else if success_rate >= 50.0 {
            StatusBand::NeedsAttention
        } else {
            StatusBand::Critical
        }
    }

    pub fn label(&self, locale: &str) -> String {
        match self {
            StatusBand::Perfect => t!("report.band.perfect", locale = locale),
            StatusBand::Excellent => t!("report.band.excellent", locale = locale),
            StatusBand::Good => t!("report.band.good", locale = locale),
            StatusBand::Fair => t!("report.band.fair", locale = locale),
            StatusBand::NeedsAttention => t!("report.band.needs_attention", locale = locale),
            StatusBand::Critical => t!("report.band.critical", locale = locale),
        }
        .to_string()
    }

    /// ✅ at 100%, ⚠️ from 80%, ❌ below.
    pub fn emoji(&self) -> &'static str {
        match self {
            StatusBand::Perfect => "✅",
            StatusBand::Excellent | StatusBand::Good => "⚠️",
            _ => "❌",
        }
    }

    /// Dashboard colour: green at 100%, amber from 80%, red below.
    /// 仪表板颜色：100% 为绿色，80% 及以上为琥珀色，以下为红色。
    pub fn color(&self) -> &'static str {
        match self {
            StatusBand::Perfect => "#10b981",
            StatusBand::Excellent | StatusBand::Good => "#f59e0b",
            _ => "#ef4444",
        }
    }
}

/// Escapes `& < > " '` for embedding text into HTML.
/// 转义 `& < > " '` 以便将文本嵌入 HTML。
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
