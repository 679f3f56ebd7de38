//! # Command Module Module / 命令模块
//!
//! Modules and suite hooks declared in `Bot.toml` run shell commands. A command
//! module passes when the command exits with status 0 and, if configured, its
//! output contains the expected text.
//!
//! 在 `Bot.toml` 中声明的模块和套件钩子运行 shell 命令。当命令以状态 0 退出，
//! 并且（如果配置了）其输出包含预期文本时，命令模块通过。

use anyhow::{Result, bail};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::core::config::{ConfigFile, ModuleDefinition, SuiteDefinition};
use crate::core::execution::ExecutionEngine;
use crate::core::models::ModuleOutcome;
use crate::core::module::{Module, ModuleContext, ModuleInfo, Suite};
use crate::infra::command::run_command_line;

/// Output is cut to this many trailing characters in result details.
const MAX_OUTPUT_CHARS: usize = 4_000;

/// A module whose `execute` runs a shell command.
/// 一个 `execute` 运行 shell 命令的模块。
#[derive(Debug, Clone)]
pub struct CommandModule {
    info: ModuleInfo,
    command: String,
    timeout: Option<Duration>,
    expect_output: Option<String>,
}

impl CommandModule {
    pub fn new(info: ModuleInfo, command: impl Into<String>) -> Self {
        Self {
            info,
            command: command.into(),
            timeout: None,
            expect_output: None,
        }
    }

    /// Kills the command and fails the attempt once `timeout` elapses.
    /// 超过 `timeout` 后终止命令并使本次尝试失败。
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn expect_output(mut self, text: impl Into<String>) -> Self {
        self.expect_output = Some(text.into());
        self
    }

    pub fn from_definition(def: &ModuleDefinition) -> Self {
        let mut info = ModuleInfo::new(&def.id, &def.name)
            .description(&def.description)
            .category(&def.category)
            .tags(def.tags.iter().cloned())
            .enabled(def.enabled)
            .retry_on_failure(def.retry_on_failure);
        if let Some(secs) = def.timeout_secs {
            info = info.timeout(Duration::from_secs(secs));
        }

        let mut module = Self::new(info, &def.command);
        if let Some(secs) = def.timeout_secs {
            module = module.timeout(Duration::from_secs(secs));
        }
        if let Some(text) = &def.expect_output {
            module = module.expect_output(text);
        }
        module
    }
}

#[async_trait]
impl Module for CommandModule {
    fn info(&self) -> &ModuleInfo {
        &self.info
    }

    async fn execute(&self, _ctx: &ModuleContext) -> Result<ModuleOutcome> {
        let run = run_command_line(&self.command);
        let finished = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, run).await {
                Ok(finished) => finished?,
                Err(_) => {
                    return Ok(ModuleOutcome::failed(format!(
                        "Command timed out after {}s",
                        limit.as_secs()
                    )));
                }
            },
            None => run.await?,
        };

        let details = json!({
            "command": finished.command_line,
            "exitCode": finished.exit_code(),
            "output": tail(&finished.output, MAX_OUTPUT_CHARS),
        });

        if !finished.success() {
            let code = finished
                .exit_code()
                .map_or_else(|| "signal".to_string(), |c| c.to_string());
            return Ok(ModuleOutcome::failed(format!("Command exited with status {code}"))
                .with_details(details));
        }

        if let Some(expected) = &self.expect_output {
            if !finished.output.contains(expected.as_str()) {
                return Ok(ModuleOutcome::failed(format!(
                    "Command output does not contain '{expected}'"
                ))
                .with_details(details));
            }
        }

        Ok(ModuleOutcome::success().with_details(details))
    }
}

fn tail(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    if count <= max_chars {
        text.to_string()
    } else {
        text.chars().skip(count - max_chars).collect()
    }
}

/// Runs a hook command; a non-zero exit status is an error.
async fn run_hook_command(command: &str) -> Result<()> {
    let finished = run_command_line(command).await?;
    if !finished.success() {
        bail!(
            "Hook command '{}' failed with status {:?}: {}",
            finished.command_line,
            finished.exit_code(),
            finished.output.trim()
        );
    }
    Ok(())
}

/// Builds a suite from its definition, turning hook commands into hooks.
/// 根据定义构建套件，将钩子命令转换为钩子。
pub fn suite_from_definition(def: &SuiteDefinition) -> Suite {
    let mut suite = Suite::new(&def.id, &def.name, def.modules.iter().cloned())
        .description(&def.description)
        .stop_on_failure(def.stop_on_failure);

    if let Some(command) = def.setup.clone() {
        let command: Arc<str> = command.into();
        suite = suite.with_setup(move |_ctx| {
            let command = Arc::clone(&command);
            async move { run_hook_command(&command).await }
        });
    }
    if let Some(command) = def.teardown.clone() {
        let command: Arc<str> = command.into();
        suite = suite.with_teardown(move |_ctx| {
            let command = Arc::clone(&command);
            async move { run_hook_command(&command).await }
        });
    }
    suite
}

/// Registers every module and suite declared in `config`.
/// 注册 `config` 中声明的所有模块和套件。
pub fn register_from_config(engine: &mut ExecutionEngine, config: &ConfigFile) {
    for def in &config.modules {
        engine.register_module(Arc::new(CommandModule::from_definition(def)));
    }
    for def in &config.suites {
        engine.register_suite(suite_from_definition(def));
    }
}
