//! # Configuration Module / 配置模块
//!
//! Runner settings, named presets and the on-disk `Bot.toml` format that also
//! declares command modules and suites.
//!
//! 运行器设置、命名预设，以及同时声明命令模块和套件的 `Bot.toml` 文件格式。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::infra::fs::expand_path;
use crate::reporting::ReportFormat;

/// Global settings consumed by the engine, the runner and the report generator.
/// 引擎、运行器和报告生成器使用的全局设置。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// The language for output messages (e.g., "en", "zh-CN").
    /// 输出消息的语言（例如 "en", "zh-CN"）。
    #[serde(default = "default_language")]
    pub language: String,
    /// Base URL handed to the browser collaborator.
    /// 交给浏览器协作者的基础 URL。
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_true")]
    pub headless: bool,
    /// Default module timeout in milliseconds. Advisory: the scheduler never enforces it.
    /// 默认模块超时时间（毫秒）。仅供参考：调度器不会强制执行。
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum number of retries for modules with `retry_on_failure`.
    /// 对启用 `retry_on_failure` 的模块的最大重试次数。
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Fixed delay between retry attempts, in milliseconds.
    /// 重试之间的固定延迟（毫秒）。
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Concurrency limit for limited-parallel suites.
    /// 有限并行套件的并发上限。
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Keep going through `run_all` after a failed module.
    /// 在 `run_all` 中遇到失败模块后继续执行。
    #[serde(default)]
    pub continue_on_failure: bool,
    #[serde(default = "default_true")]
    pub screenshot_on_failure: bool,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub reporting: ReportingConfig,
}

/// Report output settings.
/// 报告输出设置。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportingConfig {
    /// Directory for file artifacts. `None` keeps rendered reports in memory.
    /// 文件产物的目录。`None` 表示将渲染结果保存在内存中。
    #[serde(default = "default_output_dir")]
    pub output_dir: Option<PathBuf>,
    #[serde(default = "default_formats")]
    pub formats: Vec<ReportFormat>,
    #[serde(default = "default_true")]
    pub historical_comparison: bool,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            formats: default_formats(),
            historical_comparison: true,
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    1_000
}

fn default_concurrency() -> usize {
    3
}

fn default_output_dir() -> Option<PathBuf> {
    Some(PathBuf::from("./reports"))
}

fn default_formats() -> Vec<ReportFormat> {
    vec![ReportFormat::Json, ReportFormat::Markdown, ReportFormat::Console]
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            base_url: default_base_url(),
            headless: true,
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            concurrency: default_concurrency(),
            continue_on_failure: false,
            screenshot_on_failure: true,
            verbose: false,
            reporting: ReportingConfig::default(),
        }
    }
}

impl RunnerConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Applies `BASE_URL`, `HEADLESS`, `TIMEOUT` and `REPORT_DIR` overrides
    /// using the given lookup (normally `std::env::var`).
    ///
    /// 使用给定的查找函数（通常为 `std::env::var`）应用
    /// `BASE_URL`、`HEADLESS`、`TIMEOUT` 和 `REPORT_DIR` 覆盖。
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("BASE_URL") {
            self.base_url = url;
        }
        if let Some(headless) = lookup("HEADLESS") {
            self.headless = !matches!(headless.trim(), "false" | "0" | "no");
        }
        if let Some(timeout) = lookup("TIMEOUT").and_then(|v| v.trim().parse().ok()) {
            self.timeout_ms = timeout;
        }
        if let Some(dir) = lookup("REPORT_DIR") {
            let raw = PathBuf::from(dir);
            let dir = expand_path(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "using REPORT_DIR unexpanded");
                raw
            });
            self.reporting.output_dir = Some(dir);
        }
    }
}

/// Named bundles of configuration defaults.
/// 命名的配置默认值集合。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    /// Fast validation: one retry, short timeouts.
    Quick,
    /// Standard validation: two retries, standard timeouts.
    #[default]
    Mvp,
    /// CI: headless, retries, continue on failure, file reports only.
    Ci,
    /// Debug: headed, no retries, verbose, console output.
    Debug,
    /// Continuous monitoring.
    Monitoring,
}

impl Preset {
    pub const ALL: [Preset; 5] = [
        Preset::Quick,
        Preset::Mvp,
        Preset::Ci,
        Preset::Debug,
        Preset::Monitoring,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Quick => "quick",
            Preset::Mvp => "mvp",
            Preset::Ci => "ci",
            Preset::Debug => "debug",
            Preset::Monitoring => "monitoring",
        }
    }

    /// Builds the runner configuration this preset stands for.
    /// 构建此预设所代表的运行器配置。
    pub fn config(&self) -> RunnerConfig {
        let base = RunnerConfig::default();
        match self {
            Preset::Quick => RunnerConfig {
                max_retries: 1,
                timeout_ms: 10_000,
                retry_delay_ms: 500,
                ..base
            },
            Preset::Mvp => base,
            Preset::Ci => RunnerConfig {
                headless: true,
                continue_on_failure: true,
                reporting: ReportingConfig {
                    formats: vec![ReportFormat::Json, ReportFormat::Markdown, ReportFormat::Html],
                    ..ReportingConfig::default()
                },
                ..base
            },
            Preset::Debug => RunnerConfig {
                headless: false,
                max_retries: 0,
                verbose: true,
                reporting: ReportingConfig {
                    formats: vec![ReportFormat::Console],
                    ..ReportingConfig::default()
                },
                ..base
            },
            Preset::Monitoring => RunnerConfig {
                max_retries: 1,
                continue_on_failure: true,
                reporting: ReportingConfig {
                    formats: vec![ReportFormat::Json],
                    ..ReportingConfig::default()
                },
                ..base
            },
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow::anyhow!("Unknown preset: {s}"))
    }
}

/// A module declared in the configuration file whose `execute` runs a shell command.
/// 在配置文件中声明的模块，其 `execute` 运行一个 shell 命令。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// The shell command to run. Exit status 0 means success.
    /// 要运行的 shell 命令。退出码 0 表示成功。
    pub command: String,
    /// Optional timeout in seconds, enforced by the command module itself.
    /// 可选超时（秒），由命令模块自身执行。
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub retry_on_failure: bool,
    /// A substring the command output must contain for the module to pass.
    /// 命令输出必须包含的子串，模块才算通过。
    #[serde(default)]
    pub expect_output: Option<String>,
}

fn default_category() -> String {
    "GENERAL".to_string()
}

/// A suite declared in the configuration file.
/// 在配置文件中声明的套件。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub modules: Vec<String>,
    #[serde(default)]
    pub stop_on_failure: bool,
    #[serde(default)]
    pub setup: Option<String>,
    #[serde(default)]
    pub teardown: Option<String>,
}

/// The complete contents of a `Bot.toml` file.
/// `Bot.toml` 文件的完整内容。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(flatten)]
    pub settings: RunnerConfig,
    #[serde(default)]
    pub modules: Vec<ModuleDefinition>,
    #[serde(default)]
    pub suites: Vec<SuiteDefinition>,
}

impl ConfigFile {
    /// Parses a configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut file: ConfigFile = toml::from_str(content).context("Failed to parse configuration")?;
        if let Some(dir) = file.settings.reporting.output_dir.take() {
            file.settings.reporting.output_dir = Some(expand_path(&dir)?);
        }
        Ok(file)
    }
}

/// Loads `path`, layered on top of `preset`, then applies environment overrides.
/// A missing file is not an error: the preset alone is returned.
///
/// 加载 `path`，叠加在 `preset` 之上，然后应用环境变量覆盖。
/// 文件不存在不视为错误：仅返回预设。
pub fn load_config(path: &Path, preset: Option<Preset>) -> Result<ConfigFile> {
    let mut file = if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let table: toml::Table = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        let merged = merge_onto_preset(preset.unwrap_or_default(), table)?;
        ConfigFile::from_toml(&merged)?
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using preset");
        ConfigFile {
            settings: preset.unwrap_or_default().config(),
            ..ConfigFile::default()
        }
    };

    file.settings.apply_env_overrides(|key| std::env::var(key).ok());
    Ok(file)
}

/// Keys present in the file win over the preset's values.
fn merge_onto_preset(preset: Preset, file: toml::Table) -> Result<String> {
    let preset_text =
        toml::to_string(&preset.config()).context("Failed to serialize preset configuration")?;
    let mut merged: toml::Table =
        toml::from_str(&preset_text).context("Failed to serialize preset configuration")?;
    for (key, value) in file {
        match (merged.get_mut(&key), value) {
            (Some(toml::Value::Table(base)), toml::Value::Table(overlay)) => {
                for (k, v) in overlay {
                    base.insert(k, v);
                }
            }
            (_, value) => {
                merged.insert(key, value);
            }
        }
    }
    toml::to_string(&merged).context("Failed to merge configuration")
}
