//! # Run Commands Module / 运行命令模块
//!
//! The `test` and `test-all` commands: load the configuration, register the
//! configured modules, run them, print progress and a summary, generate the
//! configured reports and map failures to a non-zero exit code.
//!
//! `test` 和 `test-all` 命令：加载配置、注册已配置的模块、运行它们、打印进度和摘要、
//! 生成配置的报告，并将失败映射为非零退出码。

use anyhow::Result;
use colored::*;

use crate::cli::commands::{Session, attach_progress, build_runner, load_session};
use crate::cli::{GlobalArgs, ReportArgs};
use crate::core::config::RunnerConfig;
use crate::core::models::{ExecutionMode, RunReport, TestFilter};
use crate::core::TestRunner;
use crate::infra::fs::expand_path;
use crate::infra::t;
use crate::reporting::format::{StatusBand, format_duration};
use crate::reporting::{GeneratedReport, ReportFormat, ReportGenerator};

/// Runs one suite (when `target` names a suite) or one module.
/// 运行一个套件（当 `target` 是套件 id 时）或一个模块。
pub async fn execute_test(
    global: &GlobalArgs,
    target: &str,
    mode: ExecutionMode,
    headed: bool,
    report: ReportArgs,
) -> Result<()> {
    let mut session = load_session(global)?;
    apply_report_args(&mut session.file.settings, &report)?;
    if headed {
        session.file.settings.headless = false;
    }
    let locale = session.locale.clone();

    let runner = build_runner(&session.file);
    attach_progress(runner.engine().events(), &locale);

    let run = if runner.engine().suite(target).is_some() {
        println!(
            "{}",
            t!("run.running_suite", locale = &locale, id = target, mode = mode).bold()
        );
        runner.run_suite(target, mode).await
    } else {
        println!("{}", t!("run.running_module", locale = &locale, id = target).bold());
        runner.run_module(target).await
    };

    finish_run(runner, run, &session).await
}

/// Runs every module matching `filter` in registry order.
/// 按注册顺序运行所有匹配 `filter` 的模块。
pub async fn execute_test_all(
    global: &GlobalArgs,
    filter: TestFilter,
    report: ReportArgs,
) -> Result<()> {
    let mut session = load_session(global)?;
    apply_report_args(&mut session.file.settings, &report)?;
    let locale = session.locale.clone();

    let runner = build_runner(&session.file);
    let plan = runner.plan(Some(&filter));
    if plan.excluded_count > 0 || plan.not_included_count > 0 {
        println!(
            "{}",
            t!(
                "run.filtered_modules",
                locale = &locale,
                excluded = plan.excluded_count,
                skipped = plan.not_included_count
            )
            .cyan()
        );
    }
    if plan.module_ids.is_empty() {
        println!("{}", t!("run.no_modules", locale = &locale).yellow());
        return Ok(());
    }

    println!(
        "{}",
        t!("run.running_all", locale = &locale, count = plan.module_ids.len()).bold()
    );
    attach_progress(runner.engine().events(), &locale);
    let run = runner.run_all(Some(filter)).await;

    finish_run(runner, run, &session).await
}

/// Command-line report options override the configuration.
/// 命令行报告选项覆盖配置。
pub(crate) fn apply_report_args(settings: &mut RunnerConfig, args: &ReportArgs) -> Result<()> {
    if !args.formats.is_empty() {
        settings.reporting.formats = args.formats.clone();
    }
    if let Some(output) = &args.output {
        settings.reporting.output_dir = Some(expand_path(output)?);
    }
    if args.continue_on_failure {
        settings.continue_on_failure = true;
    }
    Ok(())
}

async fn finish_run(mut runner: TestRunner, report: RunReport, session: &Session) -> Result<()> {
    let locale = session.locale.as_str();
    let reporting = &session.file.settings.reporting;

    let mut generator = ReportGenerator::new(reporting).with_locale(locale);
    let generated = generator.generate_reports(&report);
    if !reporting.formats.contains(&ReportFormat::Console) {
        print_short_summary(&report, locale);
    }
    print_generated(&generated, locale);

    runner.cleanup().await;

    if report.has_failures() {
        anyhow::bail!(t!("run.failed", locale = locale, count = report.summary.failed).to_string());
    }
    println!("\n{}", t!("run.all_passed", locale = locale).green().bold());
    Ok(())
}

fn print_short_summary(report: &RunReport, locale: &str) {
    let summary = &report.summary;
    let band = StatusBand::from_rate(summary.success_rate);
    println!(
        "\n{} {}",
        band.emoji(),
        t!(
            "run.summary_line",
            locale = locale,
            total = summary.total,
            passed = summary.passed.to_string().green(),
            failed = summary.failed.to_string().red(),
            skipped = summary.skipped,
            rate = format!("{:.2}", summary.success_rate),
            duration = format_duration(report.duration)
        )
    );
}

fn print_generated(generated: &[GeneratedReport], locale: &str) {
    for report in generated {
        match (&report.path, &report.error) {
            (_, Some(error)) => println!(
                "{} {}",
                "✘".red(),
                t!("run.report_failed", locale = locale, format = report.format, error = error).red()
            ),
            (Some(path), None) => println!(
                "📄 {}",
                t!("run.report_written", locale = locale, format = report.format, path = path.display())
            ),
            (None, None) => {}
        }
    }
}
