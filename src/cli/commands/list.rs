//! # List Command Module / 列表命令模块
//!
//! Prints the modules and suites declared in the configuration.
//!
//! 打印配置中声明的模块和套件。

use anyhow::Result;
use colored::*;

use crate::cli::GlobalArgs;
use crate::cli::commands::{build_runner, load_session};
use crate::infra::t;

/// `what` is `Some("modules")`, `Some("suites")` or `None` for both.
/// `what` 为 `Some("modules")`、`Some("suites")`，或 `None` 表示两者都列出。
pub fn execute(global: &GlobalArgs, what: Option<&str>) -> Result<()> {
    let session = load_session(global)?;
    let locale = session.locale.as_str();
    let runner = build_runner(&session.file);
    let engine = runner.engine();

    if what != Some("suites") {
        println!("\n{}", t!("list.modules_header", locale = locale).bold());
        let mut count = 0;
        for info in engine.modules() {
            count += 1;
            let status = if info.enabled {
                String::new()
            } else {
                format!(" {}", t!("list.disabled", locale = locale)).dimmed().to_string()
            };
            println!(
                "  {} {} [{}]{status}",
                info.id.cyan(),
                info.name,
                info.category.yellow()
            );
            if !info.tags.is_empty() {
                println!(
                    "      {}: {}",
                    t!("list.tags", locale = locale),
                    info.tags.join(", ")
                );
            }
        }
        if count == 0 {
            println!("  {}", t!("list.no_modules", locale = locale).dimmed());
        }
    }

    if what != Some("modules") {
        println!("\n{}", t!("list.suites_header", locale = locale).bold());
        let mut count = 0;
        for suite in engine.suites() {
            count += 1;
            let stop = if suite.stop_on_failure {
                format!(" ({})", t!("list.stop_on_failure", locale = locale))
            } else {
                String::new()
            };
            println!("  {} {}{stop}", suite.id.cyan(), suite.name);
            println!(
                "      {}: {}",
                t!("list.suite_modules", locale = locale),
                suite.module_ids.join(", ")
            );
        }
        if count == 0 {
            println!("  {}", t!("list.no_suites", locale = locale).dimmed());
        }
    }
    Ok(())
}
