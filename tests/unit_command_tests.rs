//! # Command Module Unit Tests / 命令模块单元测试
//!
//! Command-line parsing, command modules and suite hooks declared in
//! configuration, and the backoff helper.
//!
//! 命令行解析、配置中声明的命令模块和套件钩子，以及退避辅助函数。

mod common;

use bot_runner::config::{ConfigFile, ModuleDefinition, SuiteDefinition};
use bot_runner::core::ExecutionEngine;
use bot_runner::core::command_module::{CommandModule, register_from_config};
use bot_runner::core::{ModuleInfo, ModuleStatus};
use bot_runner::infra::command::{parse_command_line, run_command_line};
use bot_runner::infra::retry::retry_with_backoff;
use bot_runner::models::ExecutionMode;
use common::fast_config;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

fn definition(id: &str, command: &str) -> ModuleDefinition {
    ModuleDefinition {
        id: id.to_string(),
        name: id.to_string(),
        description: String::new(),
        category: "GENERAL".to_string(),
        tags: Vec::new(),
        enabled: true,
        command: command.to_string(),
        timeout_secs: None,
        retry_on_failure: false,
        expect_output: None,
    }
}

#[cfg(test)]
mod parse_tests {
    use super::*;

    #[test]
    fn test_parse_command_line_splits_quoted_arguments() {
        let (program, args) = parse_command_line(r#"echo "hello world" again"#).unwrap();
        assert_eq!(program, "echo");
        assert_eq!(args, vec!["hello world", "again"]);
    }

    #[test]
    fn test_parse_empty_command_fails() {
        assert!(parse_command_line("   ").is_err());
    }

    #[tokio::test]
    async fn test_run_command_line_captures_output() {
        let output = run_command_line("echo hi").await.unwrap();
        assert!(output.success());
        assert_eq!(output.exit_code(), Some(0));
        assert_eq!(output.output.trim(), "hi");
    }

    #[tokio::test]
    async fn test_missing_program_is_an_error() {
        assert!(run_command_line("definitely-not-a-real-program-xyz").await.is_err());
    }
}

#[cfg(test)]
mod command_module_tests {
    use super::*;

    #[tokio::test]
    async fn test_zero_exit_passes_and_records_details() {
        let mut engine = ExecutionEngine::new(fast_config());
        engine.register_module(Arc::new(CommandModule::new(ModuleInfo::new("ok", "OK"), "echo hi")));

        let result = engine.execute_module("ok").await;

        assert_eq!(result.status, ModuleStatus::Success);
        let details = result.details.unwrap();
        assert_eq!(details["exitCode"], 0);
        assert_eq!(details["command"], "echo hi");
    }

    #[tokio::test]
    async fn test_non_zero_exit_fails() {
        let mut engine = ExecutionEngine::new(fast_config());
        engine.register_module(Arc::new(CommandModule::new(ModuleInfo::new("bad", "Bad"), "false")));

        let result = engine.execute_module("bad").await;

        assert!(result.is_failure());
        assert_eq!(result.error.as_deref(), Some("Command exited with status 1"));
        assert_eq!(result.attempts, 1);
    }

    #[tokio::test]
    async fn test_expected_output_is_checked() {
        let mut engine = ExecutionEngine::new(fast_config());
        engine.register_module(Arc::new(
            CommandModule::new(ModuleInfo::new("greet", "Greet"), "echo hello").expect_output("hello"),
        ));
        engine.register_module(Arc::new(
            CommandModule::new(ModuleInfo::new("wrong", "Wrong"), "echo hello").expect_output("goodbye"),
        ));

        assert!(engine.execute_module("greet").await.is_success());
        let wrong = engine.execute_module("wrong").await;
        assert!(wrong.is_failure());
        assert!(wrong.error.unwrap().contains("goodbye"));
    }

    #[tokio::test]
    async fn test_timeout_kills_slow_command() {
        let mut engine = ExecutionEngine::new(fast_config());
        engine.register_module(Arc::new(
            CommandModule::new(ModuleInfo::new("slow", "Slow"), "sleep 5").timeout(Duration::from_millis(100)),
        ));

        let started = Instant::now();
        let result = engine.execute_module("slow").await;

        assert!(result.is_failure());
        assert!(result.error.unwrap().contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_register_from_config_with_hooks() {
        let config = ConfigFile {
            settings: fast_config(),
            modules: vec![
                definition("one", "echo one"),
                ModuleDefinition {
                    enabled: false,
                    ..definition("off", "false")
                },
            ],
            suites: vec![SuiteDefinition {
                id: "suite".to_string(),
                name: "Suite".to_string(),
                description: String::new(),
                modules: vec!["one".to_string(), "off".to_string()],
                stop_on_failure: true,
                setup: Some("true".to_string()),
                teardown: Some("true".to_string()),
            }],
        };
        let mut engine = ExecutionEngine::new(config.settings.clone());
        register_from_config(&mut engine, &config);

        assert_eq!(engine.modules().count(), 2);
        let results = engine.execute_suite("suite", ExecutionMode::Sequential).await;

        assert_eq!(results.len(), 2);
        assert!(results[0].is_success());
        assert!(results[1].is_skipped());
    }

    #[tokio::test]
    async fn test_failing_setup_hook_aborts_suite() {
        let config = ConfigFile {
            settings: fast_config(),
            modules: vec![definition("one", "echo one")],
            suites: vec![SuiteDefinition {
                id: "suite".to_string(),
                name: "Suite".to_string(),
                description: String::new(),
                modules: vec!["one".to_string()],
                stop_on_failure: false,
                setup: Some("false".to_string()),
                teardown: None,
            }],
        };
        let mut engine = ExecutionEngine::new(config.settings.clone());
        register_from_config(&mut engine, &config);

        let results = engine.execute_suite("suite", ExecutionMode::Sequential).await;

        assert_eq!(results.len(), 1);
        assert!(results[0].is_failure());
        assert_eq!(results[0].module_id, "suite");
    }
}

#[cfg(test)]
mod backoff_tests {
    use super::*;

    #[tokio::test]
    async fn test_retry_with_backoff_returns_first_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let value = retry_with_backoff(4, Duration::from_millis(1), move |attempt| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                if attempt < 2 {
                    anyhow::bail!("not yet");
                }
                Ok(attempt)
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_with_backoff_returns_last_error() {
        let result = retry_with_backoff(3, Duration::from_millis(1), |attempt| async move {
            Err::<(), _>(anyhow::anyhow!("attempt {attempt} failed"))
        })
        .await;

        assert_eq!(result.unwrap_err().to_string(), "attempt 2 failed");
    }

    #[tokio::test]
    async fn test_zero_attempts_still_calls_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result = retry_with_backoff(0, Duration::from_millis(1), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, anyhow::Error>(()) }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
