//! # Info Command Module / 信息命令模块
//!
//! Prints the runner version, the effective settings and what the loaded
//! configuration registers.
//!
//! 打印运行器版本、生效的设置以及已加载配置注册的内容。

use anyhow::Result;
use colored::*;

use crate::cli::GlobalArgs;
use crate::cli::commands::{build_runner, load_session};
use crate::core::config::Preset;
use crate::core::models::ExecutionMode;
use crate::infra::t;
use crate::reporting::ReportFormat;

fn joined<T>(items: impl IntoIterator<Item = T>, name: impl Fn(&T) -> &'static str) -> String {
    items.into_iter().map(|item| name(&item)).collect::<Vec<_>>().join(", ")
}

pub fn execute(global: &GlobalArgs) -> Result<()> {
    let session = load_session(global)?;
    let locale = session.locale.as_str();
    let settings = &session.file.settings;
    let runner = build_runner(&session.file);
    let engine = runner.engine();

    println!(
        "\n{} {}",
        env!("CARGO_PKG_NAME").bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  {}", t!("cli.about", locale = locale));

    println!("\n{}", t!("info.settings_header", locale = locale).bold());
    let rows = [
        (t!("info.base_url", locale = locale), settings.base_url.clone()),
        (t!("info.headless", locale = locale), settings.headless.to_string()),
        (t!("info.timeout", locale = locale), format!("{}ms", settings.timeout_ms)),
        (t!("info.max_retries", locale = locale), settings.max_retries.to_string()),
        (t!("info.concurrency", locale = locale), settings.concurrency.to_string()),
        (t!("info.language", locale = locale), settings.language.clone()),
        (
            t!("info.report_formats", locale = locale),
            joined(settings.reporting.formats.iter().copied(), ReportFormat::as_str),
        ),
    ];
    for (label, value) in rows {
        println!("  {label}: {}", value.yellow());
    }

    println!("\n{}", t!("info.registry_header", locale = locale).bold());
    let enabled = engine.modules().filter(|m| m.enabled).count();
    println!(
        "  {}",
        t!(
            "info.registry_counts",
            locale = locale,
            modules = engine.modules().count(),
            enabled = enabled,
            suites = engine.suites().count()
        )
    );

    println!("\n{}", t!("info.capabilities_header", locale = locale).bold());
    println!(
        "  {}: {}",
        t!("info.presets", locale = locale),
        joined(Preset::ALL, Preset::as_str)
    );
    println!(
        "  {}: {}",
        t!("info.modes", locale = locale),
        joined(
            [
                ExecutionMode::Sequential,
                ExecutionMode::Parallel,
                ExecutionMode::LimitedParallel
            ],
            ExecutionMode::as_str
        )
    );
    println!(
        "  {}: {}",
        t!("info.formats", locale = locale),
        joined(ReportFormat::ALL, ReportFormat::as_str)
    );
    Ok(())
}
