//! # Monitor Command Module / 监控命令模块
//!
//! Runs a suite repeatedly on an interval until Ctrl-C. The cycle in progress
//! always finishes before the loop stops.
//!
//! 按间隔重复运行一个套件，直到按下 Ctrl-C。正在进行的周期总会在循环停止前完成。

use anyhow::Result;
use colored::*;
use std::time::Duration;
use tokio::signal;

use crate::cli::GlobalArgs;
use crate::cli::commands::{build_runner, load_session};
use crate::core::events::EventKind;
use crate::infra::t;

pub async fn execute(global: &GlobalArgs, suite_id: &str, interval: Duration) -> Result<()> {
    let session = load_session(global)?;
    let locale = session.locale.clone();
    let mut runner = build_runner(&session.file);

    let l = locale.clone();
    runner.engine().events().on(EventKind::MonitoringCycleCompleted, move |event| {
        let summary = &event.data["summary"];
        let failed = summary["failed"].as_u64().unwrap_or_default();
        let line = t!(
            "monitor.cycle",
            locale = &l,
            cycle = event.data["cycle"],
            passed = summary["passed"],
            failed = failed,
            total = summary["total"]
        );
        if failed == 0 {
            println!("{} {}", "✔".green(), line.green());
        } else {
            println!("{} {}", "✘".red(), line.red());
        }
        Ok(())
    });
    let l = locale.clone();
    runner.engine().events().on(EventKind::MonitoringFailuresDetected, move |event| {
        for failure in event.data["failures"].as_array().into_iter().flatten() {
            println!(
                "    {} {}: {}",
                "-".red(),
                failure["moduleId"].as_str().unwrap_or_default().cyan(),
                failure["error"]
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| t!("report.unknown_error", locale = &l).to_string())
            );
        }
        Ok(())
    });

    println!(
        "{}",
        t!(
            "monitor.starting",
            locale = &locale,
            id = suite_id,
            seconds = interval.as_secs()
        )
        .bold()
    );

    let cycles = {
        let monitoring = runner.start_monitoring(suite_id, interval);
        tokio::pin!(monitoring);
        tokio::select! {
            result = &mut monitoring => result?,
            _ = signal::ctrl_c() => {
                println!("\n{}", t!("monitor.stopping", locale = &locale).yellow());
                runner.stop_monitoring();
                monitoring.await?
            }
        }
    };

    println!("{}", t!("monitor.stopped", locale = &locale, cycles = cycles).bold());
    runner.cleanup().await;
    Ok(())
}
