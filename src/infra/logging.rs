//! # Logging Module / 日志模块
//!
//! Tracing setup for the command-line binary. Log records go to stderr so they
//! never mix with the colored progress output on stdout.
//!
//! 命令行二进制程序的 tracing 设置。日志记录输出到 stderr，
//! 因此不会与 stdout 上的彩色进度输出混在一起。

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initializes the global subscriber. `RUST_LOG` wins when set; otherwise the
/// crate logs at `info` (`debug` when verbose) and dependencies at `warn`.
///
/// 初始化全局订阅者。设置了 `RUST_LOG` 时以其为准；否则本 crate 以 `info`
/// （verbose 时为 `debug`）级别记录，依赖项以 `warn` 级别记录。
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "bot_runner=debug,warn"
        } else {
            "bot_runner=info,warn"
        })
    });

    // A second call (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init();
}
