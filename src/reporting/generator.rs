//! # Report Generator Module / 报告生成器模块
//!
//! Drives the renderers: one artifact per requested format, each generated
//! independently so that a failing format never stops the others. Every call
//! also records the run in the bounded history.
//!
//! 驱动各渲染器：每个请求的格式生成一个产物，彼此独立，一个格式失败不会阻止其他格式。
//! 每次调用还会将本次运行记录到有界历史中。

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;

use crate::core::config::ReportingConfig;
use crate::core::models::RunReport;
use crate::infra::fs::{ensure_output_dir, report_file_name, write_artifact};
use crate::reporting::history::{HistoryEntry, RunHistory, TrendAnalysis};
use crate::reporting::json::SNAPSHOT_HISTORY_LEN;
use crate::reporting::{
    GeneratedReport, ReportFormat, render_console, render_html, render_json, render_markdown,
};

#[derive(Debug, Clone)]
pub struct ReportGenerator {
    output_dir: Option<PathBuf>,
    formats: Vec<ReportFormat>,
    historical_comparison: bool,
    locale: String,
    history: RunHistory,
}

impl ReportGenerator {
    pub fn new(config: &ReportingConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            formats: config.formats.clone(),
            historical_comparison: config.historical_comparison,
            locale: "en".to_string(),
            history: RunHistory::new(),
        }
    }

    /// Sets the locale used for human-readable labels.
    /// 设置人类可读标签所使用的语言。
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn formats(&self) -> &[ReportFormat] {
        &self.formats
    }

    /// Generates every configured format for `report`.
    ///
    /// The run is appended to the history before any renderer runs, so the
    /// trend sections already include it. The output directory is created once
    /// on demand; if that fails, each file format reports the error.
    ///
    /// 为 `report` 生成所有配置的格式。
    /// 在任何渲染器运行之前先将本次运行追加到历史中，因此趋势部分已包含它。
    /// 输出目录按需创建一次；若创建失败，每个文件格式都会报告该错误。
    pub fn generate_reports(&mut self, report: &RunReport) -> Vec<GeneratedReport> {
        self.history.push(HistoryEntry::from(report));
        let generated_at = Utc::now();

        let needs_dir = self.formats.iter().any(|f| f.extension().is_some());
        let dir_error = match (&self.output_dir, needs_dir) {
            (Some(dir), true) => ensure_output_dir(dir).err().map(|e| format!("{e:#}")),
            _ => None,
        };

        let mut reports = Vec::with_capacity(self.formats.len());
        for format in self.formats.clone() {
            if let (Some(error), Some(_)) = (&dir_error, format.extension()) {
                reports.push(GeneratedReport::failed(format, error.clone()));
                continue;
            }

            let attempt = std::panic::catch_unwind(AssertUnwindSafe(|| {
                self.generate_one(format, report, generated_at)
            }));
            let generated = match attempt {
                Ok(Ok(generated)) => generated,
                Ok(Err(e)) => GeneratedReport::failed(format, format!("{e:#}")),
                Err(panic) => GeneratedReport::failed(format, panic_text(panic)),
            };
            if let Some(error) = &generated.error {
                tracing::error!(format = %format, error = %error, "report generation failed");
            }
            reports.push(generated);
        }
        reports
    }

    fn generate_one(
        &self,
        format: ReportFormat,
        report: &RunReport,
        generated_at: DateTime<Utc>,
    ) -> Result<GeneratedReport> {
        let content = match format {
            ReportFormat::Console => {
                let rendered = render_console(report, &self.locale);
                println!("{rendered}");
                return Ok(GeneratedReport::rendered(format, rendered));
            }
            ReportFormat::Json => {
                let history = self
                    .historical_comparison
                    .then(|| self.history.recent(SNAPSHOT_HISTORY_LEN));
                render_json(report, history, generated_at)?
            }
            ReportFormat::Markdown => {
                let history = self.historical_comparison.then_some(&self.history);
                render_markdown(report, history, &self.locale)
            }
            ReportFormat::Html => render_html(report, &self.locale),
        };

        match (&self.output_dir, format.extension()) {
            (Some(dir), Some(extension)) => {
                let name = report_file_name(generated_at, extension);
                let path = write_artifact(dir, &name, &content)?;
                tracing::info!(format = %format, path = %path.display(), "report written");
                Ok(GeneratedReport::written(format, path))
            }
            _ => Ok(GeneratedReport::rendered(format, content)),
        }
    }

    pub fn history(&self) -> &RunHistory {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn trend(&self) -> TrendAnalysis {
        self.history.trend()
    }
}

fn panic_text(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("Renderer panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("Renderer panicked: {s}")
    } else {
        "Renderer panicked".to_string()
    }
}
