//! # Retry Helper Module / 重试辅助模块
//!
//! A generic exponential-backoff retry for module authors who need to retry a
//! single flaky step inside `execute`. The engine's own retry loop uses a fixed
//! delay and is independent of this helper.
//!
//! 为需要在 `execute` 内部重试单个不稳定步骤的模块作者提供的通用指数退避重试。
//! 引擎自身的重试循环使用固定延迟，与此辅助函数无关。

use anyhow::Result;
use std::time::Duration;

/// Calls `op` up to `max_attempts` times (at least once), sleeping
/// `base_delay * 2^attempt` between attempts. Returns the first success or the
/// last error.
///
/// # Arguments
/// * `max_attempts` - Total number of calls, including the first one
/// * `base_delay` - Delay before the second call; doubled after every failure
/// * `op` - Receives the zero-based attempt number
///
/// 最多调用 `op` `max_attempts` 次（至少一次），每次尝试之间休眠
/// `base_delay * 2^attempt`。返回第一次成功的结果或最后一次错误。
pub async fn retry_with_backoff<T, F, Fut>(max_attempts: u32, base_delay: Duration, mut op: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt + 1 >= max_attempts => return Err(e),
            Err(e) => {
                let delay = base_delay.saturating_mul(2u32.saturating_pow(attempt));
                tracing::debug!(attempt = attempt + 1, max_attempts, ?delay, error = %e, "retrying after backoff");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
