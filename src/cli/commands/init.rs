//! # Configuration Initialization Module / 配置初始化模块
//!
//! This module provides functionality for initializing a new `Bot.toml`
//! configuration through an interactive command-line wizard. It helps users pick
//! a preset, a base URL and a few module templates, and groups the chosen
//! modules into a smoke suite.
//!
//! 此模块通过交互式命令行向导提供初始化新 `Bot.toml` 配置的功能。
//! 它帮助用户选择预设、基础 URL 和若干模块模板，并将所选模块组合为一个冒烟测试套件。
//!
//! ## Features / 功能特性
//!
//! - **Interactive Wizard**: Step-by-step guidance for configuration setup
//! - **Template Selection**: Pre-defined module templates for common checks
//! - **Overwrite Protection**: Confirmation prompts before overwriting existing configurations
//!
//! - **交互式向导**: 配置设置的逐步指导
//! - **模板选择**: 常见检查的预定义模块模板
//! - **覆盖保护**: 覆盖现有配置前的确认提示

use anyhow::{Context, Result};
use colored::*;
use dialoguer::{Confirm, Input, MultiSelect, Select, theme::ColorfulTheme};
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::core::config::{ModuleDefinition, Preset, RunnerConfig, SuiteDefinition};
use crate::infra::t;

/// Module and suite declarations, serialized after the settings so that the
/// arrays of tables come last in the file.
#[derive(Serialize)]
struct Catalog<'a> {
    modules: &'a [ModuleDefinition],
    suites: &'a [SuiteDefinition],
}

/// Runs the interactive wizard to generate a configuration file at `config_path`.
///
/// With `non_interactive`, a default configuration is written without any
/// prompt (an existing file is overwritten).
///
/// 运行交互式向导，在 `config_path` 生成配置文件。
/// 使用 `non_interactive` 时，不进行任何提示直接写入默认配置（会覆盖已有文件）。
pub fn run_init_wizard(config_path: &Path, language: &str, non_interactive: bool) -> Result<()> {
    let theme = ColorfulTheme::default();

    if non_interactive {
        let settings = RunnerConfig {
            language: language.to_string(),
            ..RunnerConfig::default()
        };
        let (modules, suites) = default_catalog(&settings.base_url);
        return write_config(config_path, &settings, &modules, &suites, language);
    }

    println!("\n{}", t!("init.wizard_welcome", locale = language).cyan().bold());
    println!("{}", t!("init.wizard_description", locale = language));

    if config_path.exists() {
        let confirmation = Confirm::with_theme(&theme)
            .with_prompt(t!(
                "init.overwrite_prompt",
                locale = language,
                path = config_path.display()
            ))
            .default(false)
            .interact()
            .context(t!("init.user_confirmation_failed", locale = language).to_string())?;
        if !confirmation {
            println!("{}", t!("init.aborted", locale = language));
            return Ok(());
        }
    }

    let presets: Vec<&str> = Preset::ALL.iter().map(Preset::as_str).collect();
    let preset_index = Select::with_theme(&theme)
        .with_prompt(t!("init.preset_prompt", locale = language))
        .items(&presets)
        .default(1)
        .interact()
        .context(t!("init.user_confirmation_failed", locale = language).to_string())?;
    let mut settings = Preset::ALL[preset_index].config();
    settings.language = language.to_string();

    settings.base_url = Input::with_theme(&theme)
        .with_prompt(t!("init.base_url_prompt", locale = language))
        .default(settings.base_url.clone())
        .interact_text()
        .context(t!("init.user_confirmation_failed", locale = language).to_string())?;

    let options = [
        ("health", t!("init.template_health", locale = language)),
        ("homepage", t!("init.template_homepage", locale = language)),
        ("custom", t!("init.template_custom", locale = language)),
    ];
    let selections = MultiSelect::with_theme(&theme)
        .with_prompt(t!("init.module_selection_prompt", locale = language))
        .items(&options.iter().map(|o| o.1.clone()).collect::<Vec<_>>())
        .interact()
        .context(t!("init.user_confirmation_failed", locale = language).to_string())?;

    if selections.is_empty() {
        println!("{}", t!("init.no_modules_selected", locale = language).yellow());
        let (modules, suites) = default_catalog(&settings.base_url);
        return write_config(config_path, &settings, &modules, &suites, language);
    }

    let mut modules = Vec::new();
    for i in selections {
        let module = match options[i].0 {
            "health" => health_module(&settings.base_url),
            "homepage" => homepage_module(&settings.base_url),
            "custom" => {
                let command: String = Input::with_theme(&theme)
                    .with_prompt(t!("init.custom_command_prompt", locale = language))
                    .interact_text()
                    .context(t!("init.user_confirmation_failed", locale = language).to_string())?;
                command_module("custom", "Custom Check", "GENERAL", &command)
            }
            _ => continue,
        };
        modules.push(module);
    }

    let suites = vec![smoke_suite(&modules)];
    write_config(config_path, &settings, &modules, &suites, language)
}

fn command_module(id: &str, name: &str, category: &str, command: &str) -> ModuleDefinition {
    ModuleDefinition {
        id: id.to_string(),
        name: name.to_string(),
        description: String::new(),
        category: category.to_string(),
        tags: vec!["smoke".to_string()],
        enabled: true,
        command: command.to_string(),
        timeout_secs: Some(30),
        retry_on_failure: true,
        expect_output: None,
    }
}

fn health_module(base_url: &str) -> ModuleDefinition {
    command_module(
        "health",
        "Health Check",
        "CRITICAL",
        &format!("curl -fsS {}/api/health", base_url.trim_end_matches('/')),
    )
}

fn homepage_module(base_url: &str) -> ModuleDefinition {
    command_module(
        "homepage",
        "Homepage Reachable",
        "CRITICAL",
        &format!("curl -fsS -o /dev/null {base_url}"),
    )
}

fn smoke_suite(modules: &[ModuleDefinition]) -> SuiteDefinition {
    SuiteDefinition {
        id: "smoke".to_string(),
        name: "Smoke Tests".to_string(),
        description: String::new(),
        modules: modules.iter().map(|m| m.id.clone()).collect(),
        stop_on_failure: false,
        setup: None,
        teardown: None,
    }
}

fn default_catalog(base_url: &str) -> (Vec<ModuleDefinition>, Vec<SuiteDefinition>) {
    let modules = vec![health_module(base_url), homepage_module(base_url)];
    let suites = vec![smoke_suite(&modules)];
    (modules, suites)
}

fn write_config(
    path: &Path,
    settings: &RunnerConfig,
    modules: &[ModuleDefinition],
    suites: &[SuiteDefinition],
    language: &str,
) -> Result<()> {
    let settings_toml = toml::to_string_pretty(settings)
        .context(t!("init.serialize_failed", locale = language).to_string())?;
    let catalog_toml = toml::to_string_pretty(&Catalog { modules, suites })
        .context(t!("init.serialize_failed", locale = language).to_string())?;
    let content = format!(
        "# Bot Runner configuration / Bot Runner 配置\n\n{settings_toml}\n{catalog_toml}"
    );

    fs::write(path, content).with_context(|| {
        t!("init.write_failed", locale = language, path = path.display()).to_string()
    })?;

    println!(
        "\n{} {}",
        "✔".green(),
        t!("init.success_created", locale = language, path = path.display()).bold()
    );
    println!("{}", t!("init.usage_hint", locale = language));

    Ok(())
}
