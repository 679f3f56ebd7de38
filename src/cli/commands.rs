//! # Commands Module / 命令模块
//!
//! Implementations of the `test`, `test-all`, `list`, `monitor`, `info` and
//! `init` subcommands, plus the session setup they share.
//!
//! `test`、`test-all`、`list`、`monitor`、`info` 和 `init` 子命令的实现，以及它们共享的会话设置。

pub mod info;
pub mod init;
pub mod list;
pub mod monitor;
pub mod run;

use anyhow::Result;
use colored::*;
use std::time::Duration;

use crate::cli::GlobalArgs;
use crate::core::command_module::register_from_config;
use crate::core::config::{ConfigFile, load_config};
use crate::core::events::{EventBus, EventKind};
use crate::core::{ExecutionEngine, TestRunner};
use crate::infra::t;
use crate::reporting::format::format_duration;

/// Loaded configuration plus the locale resolved for this invocation.
/// 已加载的配置以及为本次调用解析出的语言。
pub(crate) struct Session {
    pub file: ConfigFile,
    pub locale: String,
}

/// Loads the configuration, applies `--verbose` and resolves the locale:
/// `--lang` first, then the `language` setting.
///
/// 加载配置，应用 `--verbose` 并解析语言：先 `--lang`，再 `language` 设置。
pub(crate) fn load_session(global: &GlobalArgs) -> Result<Session> {
    let mut file = load_config(&global.config, global.preset)?;
    if global.verbose {
        file.settings.verbose = true;
    }
    let requested = global.lang.as_deref().unwrap_or(&file.settings.language);
    let locale = crate::resolve_locale(Some(requested));
    file.settings.language = locale.clone();
    rust_i18n::set_locale(&locale);

    println!(
        "{}",
        t!(
            "run.config_loaded",
            locale = &locale,
            path = global.config.display(),
            modules = file.modules.len(),
            suites = file.suites.len()
        )
        .dimmed()
    );
    Ok(Session { file, locale })
}

/// Builds a runner with every module and suite of `file` registered.
/// 构建一个注册了 `file` 中所有模块和套件的运行器。
pub(crate) fn build_runner(file: &ConfigFile) -> TestRunner {
    let mut engine = ExecutionEngine::new(file.settings.clone());
    register_from_config(&mut engine, file);
    TestRunner::new(engine)
}

/// Prints one colored line per module start, retry and finish.
/// 为每个模块的开始、重试和结束打印一行彩色输出。
pub(crate) fn attach_progress(events: &EventBus, locale: &str) {
    let l = locale.to_string();
    events.on(EventKind::ModuleStarted, move |event| {
        let name = event.data["moduleName"].as_str().unwrap_or_default();
        println!("{} {}", "▶".cyan(), t!("progress.started", locale = &l, name = name));
        Ok(())
    });

    let l = locale.to_string();
    events.on(EventKind::ModuleRetry, move |event| {
        println!(
            "{} {}",
            "↻".yellow(),
            t!(
                "progress.retry",
                locale = &l,
                id = event.data["moduleId"].as_str().unwrap_or_default(),
                attempt = event.data["attempt"],
                error = event.data["error"].as_str().unwrap_or_default()
            )
            .yellow()
        );
        Ok(())
    });

    let l = locale.to_string();
    events.on(EventKind::ModuleCompleted, move |event| {
        let name = event.data["moduleName"].as_str().unwrap_or_default();
        let duration = format_duration(Duration::from_millis(
            event.data["duration"].as_u64().unwrap_or_default(),
        ));
        let line = t!("progress.completed", locale = &l, name = name, duration = duration);
        if event.data["status"] == "skipped" {
            println!("{} {}", "⏭".dimmed(), line.dimmed());
        } else {
            println!("{} {}", "✔".green(), line.green());
        }
        Ok(())
    });

    let l = locale.to_string();
    events.on(EventKind::ModuleFailed, move |event| {
        println!(
            "{} {}",
            "✘".red(),
            t!(
                "progress.failed",
                locale = &l,
                name = event.data["moduleName"].as_str().unwrap_or_default(),
                error = event.data["error"].as_str().unwrap_or_default()
            )
            .red()
        );
        Ok(())
    });

    let l = locale.to_string();
    events.on(EventKind::SuiteFailed, move |event| {
        println!(
            "{} {}",
            "✘".red().bold(),
            t!(
                "progress.suite_failed",
                locale = &l,
                id = event.data["suiteId"].as_str().unwrap_or_default(),
                error = event.data["error"].as_str().unwrap_or_default()
            )
            .red()
            .bold()
        );
        Ok(())
    });
}
