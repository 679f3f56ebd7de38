//! # Bot Runner Library / Bot Runner 库
//!
//! This library provides the core functionality for Bot Runner, an
//! orchestration engine for automated validation modules ("bots"): it runs
//! modules and suites with retries and three scheduling modes, monitors suites
//! on an interval, and reports every run in several formats.
//!
//! 此库为 Bot Runner 提供核心功能，这是一个自动化验证模块（"bot"）的编排引擎：
//! 它以重试和三种调度模式运行模块和套件，按间隔监控套件，并以多种格式报告每次运行。
//!
//! ## Modules / 模块
//!
//! - `core` - Data models, the module contract, the execution engine and the test runner
//! - `infra` - Infrastructure services like command execution, file system operations and logging
//! - `reporting` - Report generation, run history and trend analysis
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 数据模型、模块契约、执行引擎和测试运行器
//! - `infra` - 基础设施服务，如命令执行、文件系统操作和日志
//! - `reporting` - 报告生成、运行历史和趋势分析
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod core;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use core::config;
pub use core::execution;
pub use core::models;
pub use core::{ExecutionEngine, TestRunner};
pub use infra::t;

/// Resolves the locale to use for user-facing text.
///
/// An explicit `requested` locale wins; otherwise the system locale is used.
/// The full locale (e.g., "zh-CN") is tried first, then just the language code
/// (e.g., "en" from "en-US"), and finally the default language ("en").
///
/// 解析用于用户可见文本的语言。显式的 `requested` 优先，否则使用系统语言。
/// 先尝试完整语言标识（如 "zh-CN"），再尝试语言代码（如 "en-US" 中的 "en"），最后回退到 "en"。
pub fn resolve_locale(requested: Option<&str>) -> String {
    let locale = requested
        .map(str::to_string)
        .or_else(sys_locale::get_locale)
        .unwrap_or_else(|| "en".to_string());
    let available_locales = rust_i18n::available_locales!();

    if available_locales.contains(&locale.as_str()) {
        return locale;
    }
    locale
        .split(['-', '_'])
        .next()
        .and_then(|code| {
            available_locales
                .iter()
                .find(|l| l.eq_ignore_ascii_case(code) || l.split('-').next() == Some(code))
        })
        .map_or_else(|| "en".to_string(), |l| l.to_string())
}

/// Detects the system locale and sets it as the global i18n locale.
/// 检测系统语言并将其设置为全局 i18n 语言。
pub fn init() -> String {
    let lang = resolve_locale(None);
    rust_i18n::set_locale(&lang);
    lang
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
