//! # CLI Integration Tests / CLI 集成测试
//!
//! These tests run the `bot-runner` binary against the configurations in
//! `tests/fixtures` and check exit codes, terminal output and written files.
//!
//! 这些测试针对 `tests/fixtures` 中的配置运行 `bot-runner` 可执行文件，
//! 并检查退出码、终端输出和写入的文件。

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

const PASSING: &str = "tests/fixtures/passing.toml";
const FAILING: &str = "tests/fixtures/failing.toml";

fn bot_runner(config: &str) -> Command {
    let mut cmd = Command::cargo_bin("bot-runner").unwrap();
    cmd.arg("--lang").arg("en").arg("--config").arg(config);
    cmd
}

#[cfg(test)]
mod list_tests {
    use super::*;

    /// `list` prints every module and suite of the configuration.
    /// `list` 打印配置中的所有模块和套件。
    #[test]
    fn test_list_shows_modules_and_suites() {
        bot_runner(PASSING)
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("Modules:"))
            .stdout(predicate::str::contains("Version Check"))
            .stdout(predicate::str::contains("(disabled)"))
            .stdout(predicate::str::contains("Smoke Suite"))
            .stdout(predicate::str::contains("greet, version"));
    }

    #[test]
    fn test_list_suites_only() {
        bot_runner(PASSING)
            .args(["list", "suites"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Suites:"))
            .stdout(predicate::str::contains("Modules:").not());
    }

    /// Output follows the requested language.
    /// 输出遵循请求的语言。
    #[test]
    fn test_list_in_chinese() {
        let mut cmd = Command::cargo_bin("bot-runner").unwrap();
        cmd.args(["--lang", "zh-CN", "--config", PASSING, "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("模块："));
    }
}

#[cfg(test)]
mod run_tests {
    use super::*;

    #[test]
    fn test_passing_suite_exits_zero() {
        bot_runner(PASSING)
            .args(["test", "smoke"])
            .assert()
            .success()
            .stdout(predicate::str::contains("BOT RUNNER - TEST REPORT"))
            .stdout(predicate::str::contains("All modules passed!"));
    }

    #[test]
    fn test_single_module_in_limited_parallel_mode() {
        bot_runner(PASSING)
            .args(["test", "greet", "--mode", "limited-parallel"])
            .assert()
            .success();
    }

    #[test]
    fn test_failing_suite_exits_non_zero() {
        bot_runner(FAILING)
            .args(["test", "mixed", "--mode", "parallel"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("1 module(s) failed"));
    }

    #[test]
    fn test_unknown_target_fails() {
        bot_runner(PASSING)
            .args(["test", "ghost"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("Module ghost not found"));
    }

    #[test]
    fn test_all_filtered_by_tag() {
        bot_runner(PASSING)
            .args(["test-all", "--tags", "fast"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Running 1 modules"));
    }

    #[test]
    fn test_all_with_failure_exits_non_zero() {
        bot_runner(FAILING)
            .args(["test-all", "--continue-on-failure"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("module(s) failed"));
    }

    #[test]
    fn test_all_excluding_failures_passes() {
        bot_runner(FAILING)
            .args(["test-all", "--exclude", "broken"])
            .assert()
            .success();
    }

    #[test]
    fn test_all_with_nothing_selected() {
        bot_runner(PASSING)
            .args(["test-all", "--category", "payments"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No modules to run."));
    }

    #[test]
    fn test_all_with_json_filter() {
        bot_runner(FAILING)
            .args(["test-all", "--filter", r#"{"excludeModuleIds":["broken"]}"#])
            .assert()
            .success()
            .stdout(predicate::str::contains("Running 1 modules"));
    }

    /// A list flag replaces the same field of the JSON filter.
    /// 列表参数会替换 JSON 过滤器中的同名字段。
    #[test]
    fn test_all_tag_flag_overrides_json_filter() {
        bot_runner(PASSING)
            .args(["test-all", "--filter", r#"{"tags":["smoke"]}"#, "--tags", "fast"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Running 1 modules"));
    }

    #[test]
    fn test_all_rejects_malformed_filter() {
        bot_runner(PASSING)
            .args(["test-all", "--filter", "{tags:"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid filter JSON"));
    }

    #[test]
    fn test_reports_are_written_to_output_dir() {
        let dir = tempdir().unwrap();
        bot_runner(PASSING)
            .args(["test", "smoke", "-f", "json", "-f", "md", "--output"])
            .arg(dir.path())
            .assert()
            .success();

        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();

        assert_eq!(names.len(), 2);
        assert!(names[0].starts_with("test-report-") && names[0].ends_with(".json"));
        assert!(names[1].ends_with(".md"));

        let json = fs::read_to_string(dir.path().join(&names[0])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["summary"]["passed"], 2);
    }

    #[test]
    fn test_unknown_preset_is_rejected() {
        bot_runner(PASSING)
            .args(["--preset", "turbo", "list"])
            .assert()
            .failure();
    }
}

#[cfg(test)]
mod info_tests {
    use super::*;

    #[test]
    fn test_info_shows_settings_and_registry() {
        bot_runner(PASSING)
            .arg("info")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")))
            .stdout(predicate::str::contains("3 modules (2 enabled), 1 suites"))
            .stdout(predicate::str::contains("limited-parallel"));
    }
}

#[cfg(test)]
mod init_tests {
    use super::*;

    /// `init --non-interactive` writes a loadable configuration.
    /// `init --non-interactive` 写入可加载的配置。
    #[test]
    fn test_non_interactive_init_writes_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Bot.toml");

        Command::cargo_bin("bot-runner")
            .unwrap()
            .args(["--lang", "en", "--config"])
            .arg(&path)
            .args(["init", "--non-interactive"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Created"));

        let content = fs::read_to_string(&path).unwrap();
        let file = bot_runner::config::ConfigFile::from_toml(&content).unwrap();
        let ids: Vec<_> = file.modules.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["health", "homepage"]);
        assert_eq!(file.suites[0].id, "smoke");
        assert_eq!(file.settings.language, "en");

        bot_runner(path.to_str().unwrap())
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("Health Check"));
    }
}
