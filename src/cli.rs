//! # Command-Line Interface Module / 命令行接口模块
//!
//! Builds the localized `clap` command tree and dispatches to the command
//! implementations in [`commands`].
//!
//! 构建本地化的 `clap` 命令树，并分派到 [`commands`] 中的命令实现。

pub mod commands;

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::config::Preset;
use crate::core::models::{ExecutionMode, TestFilter};
use crate::infra::{logging, t};
use crate::reporting::ReportFormat;

/// Options shared by every subcommand.
/// 所有子命令共享的选项。
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub config: PathBuf,
    pub preset: Option<Preset>,
    pub verbose: bool,
    /// The locale given with `--lang`, if any.
    /// 通过 `--lang` 指定的语言（如果有）。
    pub lang: Option<String>,
}

/// Report options accepted by the run commands.
/// 运行命令接受的报告选项。
#[derive(Debug, Clone, Default)]
pub struct ReportArgs {
    pub formats: Vec<ReportFormat>,
    pub output: Option<PathBuf>,
    pub continue_on_failure: bool,
}

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for a `--lang <VALUE>` or `--lang=<VALUE>` argument.
fn pre_parse_language() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    if let Some(pos) = args.iter().position(|arg| arg == "--lang") {
        return args.get(pos + 1).cloned();
    }
    args.iter()
        .find_map(|arg| arg.strip_prefix("--lang="))
        .map(str::to_string)
}

fn format_arg(locale: &str) -> Arg {
    Arg::new("format")
        .short('f')
        .long("format")
        .help(t!("cli.arg_format", locale = locale).to_string())
        .value_name("FORMAT")
        .value_parser(|s: &str| s.parse::<ReportFormat>().map_err(|e| e.to_string()))
        .action(ArgAction::Append)
}

fn output_arg(locale: &str) -> Arg {
    Arg::new("output")
        .short('o')
        .long("output")
        .help(t!("cli.arg_output", locale = locale).to_string())
        .value_name("DIR")
        .value_parser(clap::value_parser!(PathBuf))
        .action(ArgAction::Set)
}

fn continue_arg(locale: &str) -> Arg {
    Arg::new("continue-on-failure")
        .long("continue-on-failure")
        .help(t!("cli.arg_continue_on_failure", locale = locale).to_string())
        .action(ArgAction::SetTrue)
}

fn list_arg(id: &'static str, help: String) -> Arg {
    Arg::new(id)
        .long(id)
        .help(help)
        .value_name("LIST")
        .value_delimiter(',')
        .action(ArgAction::Append)
}

pub fn build_cli(locale: &str) -> Command {
    Command::new("bot-runner")
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli.about", locale = locale).to_string())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli.arg_lang", locale = locale).to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help(t!("cli.arg_config", locale = locale).to_string())
                .value_name("CONFIG")
                .default_value("Bot.toml")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("preset")
                .short('p')
                .long("preset")
                .help(t!("cli.arg_preset", locale = locale).to_string())
                .value_name("PRESET")
                .value_parser(|s: &str| s.parse::<Preset>().map_err(|e| e.to_string()))
                .global(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help(t!("cli.arg_verbose", locale = locale).to_string())
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("test")
                .about(t!("cli.cmd_test_about", locale = locale).to_string())
                .arg(
                    Arg::new("target")
                        .help(t!("cli.arg_target", locale = locale).to_string())
                        .value_name("TARGET")
                        .required(true),
                )
                .arg(
                    Arg::new("mode")
                        .short('m')
                        .long("mode")
                        .help(t!("cli.arg_mode", locale = locale).to_string())
                        .value_name("MODE")
                        .default_value("sequential")
                        .value_parser(|s: &str| s.parse::<ExecutionMode>().map_err(|e| e.to_string()))
                        .action(ArgAction::Set),
                )
                .arg(format_arg(locale))
                .arg(output_arg(locale))
                .arg(
                    Arg::new("headed")
                        .long("headed")
                        .help(t!("cli.arg_headed", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(continue_arg(locale)),
        )
        .subcommand(
            Command::new("test-all")
                .about(t!("cli.cmd_test_all_about", locale = locale).to_string())
                .arg(list_arg("tags", t!("cli.arg_tags", locale = locale).to_string()))
                .arg(
                    Arg::new("category")
                        .long("category")
                        .help(t!("cli.arg_category", locale = locale).to_string())
                        .value_name("CATEGORY")
                        .value_delimiter(',')
                        .action(ArgAction::Append),
                )
                .arg(list_arg("exclude-tags", t!("cli.arg_exclude_tags", locale = locale).to_string()))
                .arg(list_arg("exclude", t!("cli.arg_exclude", locale = locale).to_string()))
                .arg(
                    Arg::new("filter")
                        .long("filter")
                        .help(t!("cli.arg_filter", locale = locale).to_string())
                        .value_name("JSON")
                        .value_parser(parse_filter_json)
                        .action(ArgAction::Set),
                )
                .arg(format_arg(locale))
                .arg(output_arg(locale))
                .arg(continue_arg(locale)),
        )
        .subcommand(
            Command::new("list")
                .about(t!("cli.cmd_list_about", locale = locale).to_string())
                .arg(
                    Arg::new("what")
                        .help(t!("cli.arg_list_what", locale = locale).to_string())
                        .value_name("WHAT")
                        .value_parser(["modules", "suites"])
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            Command::new("monitor")
                .about(t!("cli.cmd_monitor_about", locale = locale).to_string())
                .arg(
                    Arg::new("suite")
                        .help(t!("cli.arg_suite", locale = locale).to_string())
                        .value_name("SUITE")
                        .required(true),
                )
                .arg(
                    Arg::new("interval")
                        .short('i')
                        .long("interval")
                        .help(t!("cli.arg_interval", locale = locale).to_string())
                        .value_name("SECONDS")
                        .default_value("60")
                        .value_parser(clap::value_parser!(u64))
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(Command::new("info").about(t!("cli.cmd_info_about", locale = locale).to_string()))
        .subcommand(
            Command::new("init")
                .about(t!("cli.cmd_init_about", locale = locale).to_string())
                .arg(
                    Arg::new("non-interactive")
                        .long("non-interactive")
                        .help(t!("cli.arg_non_interactive", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn strings(matches: &ArgMatches, id: &str) -> Vec<String> {
    matches
        .get_many::<String>(id)
        .map(|values| {
            values
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn parse_filter_json(raw: &str) -> Result<TestFilter, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid filter JSON: {e}"))
}

/// Builds the `test-all` filter: `--filter` JSON first, then any list flag
/// given on the command line replaces the matching JSON field.
///
/// 构建 `test-all` 的过滤器：先取 `--filter` JSON，命令行上给出的列表参数会替换对应字段。
fn test_all_filter(matches: &ArgMatches) -> TestFilter {
    let mut filter = matches.get_one::<TestFilter>("filter").cloned().unwrap_or_default();
    for (id, field) in [
        ("tags", &mut filter.tags),
        ("category", &mut filter.categories),
        ("exclude-tags", &mut filter.exclude_tags),
        ("exclude", &mut filter.exclude_module_ids),
    ] {
        let values = strings(matches, id);
        if !values.is_empty() {
            *field = values;
        }
    }
    filter
}

fn report_args(matches: &ArgMatches) -> ReportArgs {
    ReportArgs {
        formats: matches
            .get_many::<ReportFormat>("format")
            .map(|f| f.copied().collect())
            .unwrap_or_default(),
        output: matches.get_one::<PathBuf>("output").cloned(),
        continue_on_failure: matches.get_flag("continue-on-failure"),
    }
}

pub async fn run() -> Result<()> {
    // Pre-parse language and initialize i18n first.
    let requested = pre_parse_language();
    let language = crate::resolve_locale(requested.as_deref());
    rust_i18n::set_locale(&language);

    let matches = build_cli(&language).get_matches();

    let global = GlobalArgs {
        config: matches
            .get_one::<PathBuf>("config")
            .cloned()
            .unwrap_or_else(|| PathBuf::from("Bot.toml")),
        preset: matches.get_one::<Preset>("preset").copied(),
        verbose: matches.get_flag("verbose"),
        lang: matches.get_one::<String>("lang").cloned(),
    };
    logging::init(global.verbose);

    match matches.subcommand() {
        Some(("test", sub)) => {
            let target = sub.get_one::<String>("target").cloned().unwrap_or_default();
            let mode = sub
                .get_one::<ExecutionMode>("mode")
                .copied()
                .unwrap_or_default();
            let headed = sub.get_flag("headed");
            commands::run::execute_test(&global, &target, mode, headed, report_args(sub)).await
        }
        Some(("test-all", sub)) => {
            commands::run::execute_test_all(&global, test_all_filter(sub), report_args(sub)).await
        }
        Some(("list", sub)) => {
            let what = sub.get_one::<String>("what").map(String::as_str);
            commands::list::execute(&global, what)
        }
        Some(("monitor", sub)) => {
            let suite = sub.get_one::<String>("suite").cloned().unwrap_or_default();
            let interval = sub.get_one::<u64>("interval").copied().unwrap_or(60);
            commands::monitor::execute(&global, &suite, Duration::from_secs(interval)).await
        }
        Some(("info", _)) => commands::info::execute(&global),
        Some(("init", sub)) => {
            let non_interactive = sub.get_flag("non-interactive");

            // Show language detection message if it was auto-detected
            if requested.is_none() {
                println!(
                    "🌐 {}",
                    t!("cli.language_detected", locale = &language, lang = &language)
                );
            }
            commands::init::run_init_wizard(&global.config, &language, non_interactive)
        }
        _ => Ok(()),
    }
}
