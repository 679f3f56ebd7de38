//! # Command Execution Module / 命令执行模块
//!
//! Spawns shell-style commands for command modules and suite hooks, capturing
//! stdout and stderr into a single string.
//!
//! 为命令模块和套件钩子派生 shell 风格的命令，并将 stdout 和 stderr 捕获到一个字符串中。

use anyhow::{Context, Result, bail};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::Mutex;

use crate::infra::t;

/// The captured result of a finished command.
/// 已结束命令的捕获结果。
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// The command line after `~` and `$VAR` expansion.
    /// 经过 `~` 和 `$VAR` 展开后的命令行。
    pub command_line: String,
    pub status: ExitStatus,
    /// Combined stdout and stderr, in arrival order.
    /// 合并的 stdout 和 stderr，按到达顺序排列。
    pub output: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.status.code()
    }
}

/// Expands `~` and environment variables in `command` and splits it into a
/// program and its arguments, shell-quoting rules included.
///
/// 展开 `command` 中的 `~` 和环境变量，并按 shell 引号规则拆分为程序和参数。
pub fn parse_command_line(command: &str) -> Result<(String, Vec<String>)> {
    let expanded = shellexpand::full(command)
        .with_context(|| format!("Failed to expand command: {command}"))?
        .to_string();

    let mut parts = shlex::split(&expanded)
        .ok_or_else(|| anyhow::anyhow!("Failed to parse command: {expanded}"))?;
    if parts.is_empty() {
        bail!(t!("command.empty").to_string());
    }
    let program = parts.remove(0);
    Ok((program, parts))
}

/// Runs `command` to completion and captures its output.
/// 运行 `command` 直到结束并捕获其输出。
pub async fn run_command_line(command: &str) -> Result<CommandOutput> {
    let (program, args) = parse_command_line(command)?;
    let command_line = std::iter::once(program.as_str())
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ");

    let mut cmd = tokio::process::Command::new(&program);
    cmd.args(&args).kill_on_drop(true);

    tracing::debug!(command = %command_line, "spawning command");
    let (status, output) = spawn_and_capture(cmd).await;
    let status = status.with_context(|| format!("Failed to run command: {command_line}"))?;

    Ok(CommandOutput {
        command_line,
        status,
        output,
    })
}

/// Spawns a command, captures its stdout and stderr.
/// The output streams are read concurrently and combined into a single string.
///
/// # Returns
/// A tuple containing:
/// - The `ExitStatus` of the process wrapped in an `io::Result`.
/// - The combined stdout and stderr as a `String`.
///
/// 派生一个命令，捕获其 stdout 和 stderr。
/// 输出流被并发读取并合并到一个字符串中。
pub async fn spawn_and_capture(
    mut cmd: tokio::process::Command,
) -> (std::io::Result<ExitStatus>, String) {
    let mut child = match cmd.stdout(Stdio::piped()).stderr(Stdio::piped()).spawn() {
        Ok(child) => child,
        Err(e) => return (Err(e), String::new()),
    };

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return (
            Err(std::io::Error::other(t!("command.capture_failed").to_string())),
            String::new(),
        );
    };

    let output = Arc::new(Mutex::new(String::new()));
    let stdout_handle = tokio::spawn(collect_lines(stdout, Arc::clone(&output)));
    let stderr_handle = tokio::spawn(collect_lines(stderr, Arc::clone(&output)));

    let status = child.wait().await;

    // Both readers must finish before the buffer is complete.
    for handle in [stdout_handle, stderr_handle] {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "failed to join output reader");
        }
    }

    let output = output.lock().await.clone();
    (status, output)
}

async fn collect_lines<R>(reader: R, output: Arc<Mutex<String>>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let mut output = output.lock().await;
        output.push_str(&line);
        output.push('\n');
    }
}
