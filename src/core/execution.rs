//! # Execution Engine Module / 执行引擎模块
//!
//! This module owns the module and suite registries and runs them. A single
//! module runs inside a bounded retry loop; a suite runs its modules under one
//! of three scheduling modes between optional setup and teardown hooks; a suite
//! can also be run repeatedly by a cancellable monitoring loop. Every step is
//! announced on the engine's event bus.
//!
//! 此模块拥有模块和套件的注册表并负责运行它们。
//! 单个模块在有界重试循环中运行；套件在可选的 setup 和 teardown 钩子之间，
//! 以三种调度模式之一运行其模块；套件还可以被可取消的监控循环反复运行。
//! 每一步都会在引擎的事件总线上发布。

use futures::FutureExt;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use serde_json::json;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::core::config::RunnerConfig;
use crate::core::events::{EventBus, EventKind};
use crate::core::models::{
    ExecutionMode, ExecutionResult, ModuleOutcome, ModuleStatus, Summary,
};
use crate::core::module::{
    Module, ModuleContext, ModuleInfo, ModuleRef, SharedState, Suite, SuiteHook,
};
use crate::infra::browser::{BrowserSession, HeadlessSession};

/// Misuse of the engine that is reported to the caller instead of being
/// turned into a failed result.
///
/// 对引擎的误用，会直接报告给调用者，而不是转换为失败结果。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("Monitoring is already running for suite '{suite_id}'")]
    MonitoringActive { suite_id: String },
    #[error("Suite '{0}' not found")]
    SuiteNotFound(String),
}

struct ActiveMonitor {
    suite_id: String,
    token: CancellationToken,
}

/// Clears the active monitor slot when the monitoring loop ends or is dropped.
struct MonitorSlot<'a>(&'a Mutex<Option<ActiveMonitor>>);

impl Drop for MonitorSlot<'_> {
    fn drop(&mut self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// The registry-driven scheduler.
///
/// Registration takes `&mut self` and is expected to happen before any
/// execution; execution and monitoring control take `&self`.
///
/// 基于注册表的调度器。
///
/// 注册需要 `&mut self`，应在任何执行之前完成；执行和监控控制只需要 `&self`。
pub struct ExecutionEngine {
    modules: BTreeMap<String, ModuleRef>,
    suites: BTreeMap<String, Suite>,
    events: EventBus,
    config: Arc<RunnerConfig>,
    browser: Arc<dyn BrowserSession>,
    browser_init: tokio::sync::Mutex<()>,
    monitor: Mutex<Option<ActiveMonitor>>,
    cleaned_up: bool,
}

impl fmt::Debug for ExecutionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionEngine")
            .field("modules", &self.modules.keys().collect::<Vec<_>>())
            .field("suites", &self.suites.keys().collect::<Vec<_>>())
            .field("events", &self.events)
            .field("monitoring", &self.is_monitoring())
            .finish()
    }
}

impl ExecutionEngine {
    /// Creates an engine backed by an in-process [`HeadlessSession`].
    /// 创建一个由进程内 [`HeadlessSession`] 支持的引擎。
    pub fn new(config: RunnerConfig) -> Self {
        let browser = Arc::new(HeadlessSession::new(config.base_url.clone(), config.headless));
        Self::with_browser(config, browser)
    }

    pub fn with_browser(config: RunnerConfig, browser: Arc<dyn BrowserSession>) -> Self {
        Self {
            modules: BTreeMap::new(),
            suites: BTreeMap::new(),
            events: EventBus::new(),
            config: Arc::new(config),
            browser,
            browser_init: tokio::sync::Mutex::new(()),
            monitor: Mutex::new(None),
            cleaned_up: false,
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn browser(&self) -> &Arc<dyn BrowserSession> {
        &self.browser
    }

    // ------------------------------------------------------------------
    // Registration / 注册
    // ------------------------------------------------------------------

    /// Registers a module, overwriting any module with the same id.
    /// 注册一个模块，覆盖具有相同 id 的模块。
    pub fn register_module(&mut self, module: ModuleRef) {
        let info = module.info().clone();
        if self.modules.contains_key(&info.id) {
            tracing::warn!(module_id = %info.id, "module already registered, overwriting");
        }
        self.cleaned_up = false;
        self.modules.insert(info.id.clone(), module);
        self.events.emit(
            EventKind::ModuleRegistered,
            json!({ "moduleId": info.id, "moduleName": info.name, "category": info.category }),
        );
    }

    pub fn register_modules<I>(&mut self, modules: I)
    where
        I: IntoIterator<Item = ModuleRef>,
    {
        for module in modules {
            self.register_module(module);
        }
    }

    /// Registers a suite, overwriting any suite with the same id. Referenced
    /// modules are resolved at execution time.
    ///
    /// 注册一个套件，覆盖具有相同 id 的套件。引用的模块在执行时解析。
    pub fn register_suite(&mut self, suite: Suite) {
        if self.suites.contains_key(&suite.id) {
            tracing::warn!(suite_id = %suite.id, "suite already registered, overwriting");
        }
        self.cleaned_up = false;
        self.events.emit(
            EventKind::SuiteRegistered,
            json!({
                "suiteId": suite.id,
                "suiteName": suite.name,
                "moduleCount": suite.module_ids.len(),
            }),
        );
        self.suites.insert(suite.id.clone(), suite);
    }

    pub fn module(&self, module_id: &str) -> Option<&ModuleRef> {
        self.modules.get(module_id)
    }

    pub fn suite(&self, suite_id: &str) -> Option<&Suite> {
        self.suites.get(suite_id)
    }

    /// Registered modules, ordered by id.
    /// 已注册的模块，按 id 排序。
    pub fn modules(&self) -> impl Iterator<Item = &ModuleInfo> {
        self.modules.values().map(|m| m.info())
    }

    /// Registered suites, ordered by id.
    /// 已注册的套件，按 id 排序。
    pub fn suites(&self) -> impl Iterator<Item = &Suite> {
        self.suites.values()
    }

    // ------------------------------------------------------------------
    // Module execution / 模块执行
    // ------------------------------------------------------------------

    /// Runs one module through the retry loop. Never fails: an unknown id, a
    /// disabled module or a module error all become a terminal result.
    ///
    /// 通过重试循环运行一个模块。永不失败：未知 id、禁用的模块或模块错误
    /// 都会转换为终止结果。
    pub async fn execute_module(&self, module_id: &str) -> ExecutionResult {
        self.run_module(module_id, None).await
    }

    async fn run_module(&self, module_id: &str, shared_state: Option<SharedState>) -> ExecutionResult {
        let Some(module) = self.modules.get(module_id).cloned() else {
            tracing::warn!(module_id, "module not found");
            return ExecutionResult::synthetic_failure(
                module_id,
                module_id,
                format!("Module {module_id} not found"),
            );
        };
        let info = module.info();

        if !info.enabled {
            tracing::debug!(module_id = %info.id, "module disabled, skipping");
            return ExecutionResult::from_outcome(
                &info.id,
                &info.name,
                ModuleOutcome::skipped(format!("Module {} is disabled", info.id)),
                Duration::ZERO,
                0,
            );
        }

        self.events.emit(
            EventKind::ModuleStarted,
            json!({ "moduleId": info.id, "moduleName": info.name }),
        );
        let start = Instant::now();

        if let Err(e) = self.ensure_browser().await {
            let result = ExecutionResult::from_outcome(
                &info.id,
                &info.name,
                ModuleOutcome::failed(format!("Browser initialization failed: {e:#}")),
                start.elapsed(),
                0,
            );
            self.emit_module_finished(&result);
            return result;
        }

        let ctx = self.context(shared_state);
        let max_retries = if info.retry_on_failure {
            self.config.max_retries
        } else {
            0
        };

        let mut attempt = 0u32;
        let outcome = loop {
            attempt += 1;
            let outcome = Self::attempt(module.as_ref(), &ctx).await;
            if outcome.status != ModuleStatus::Failed || attempt > max_retries {
                break outcome;
            }

            let error = outcome.error.clone().unwrap_or_default();
            tracing::info!(
                module_id = %info.id,
                attempt,
                max_attempts = max_retries + 1,
                %error,
                "module failed, retrying"
            );
            self.events.emit(
                EventKind::ModuleRetry,
                json!({
                    "moduleId": info.id,
                    "attempt": attempt,
                    "maxRetries": max_retries,
                    "error": error,
                }),
            );
            tokio::time::sleep(self.config.retry_delay()).await;
        };

        let result =
            ExecutionResult::from_outcome(&info.id, &info.name, outcome, start.elapsed(), attempt);
        self.emit_module_finished(&result);
        result
    }

    /// One call to `execute`, with errors and panics folded into a failed outcome.
    async fn attempt(module: &dyn Module, ctx: &ModuleContext) -> ModuleOutcome {
        match AssertUnwindSafe(module.execute(ctx)).catch_unwind().await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => ModuleOutcome::failed(format!("{e:#}")),
            Err(panic) => ModuleOutcome::failed(panic_message(panic.as_ref())),
        }
    }

    fn emit_module_finished(&self, result: &ExecutionResult) {
        let kind = if result.is_failure() {
            EventKind::ModuleFailed
        } else {
            EventKind::ModuleCompleted
        };
        self.events.emit(
            kind,
            json!({
                "moduleId": result.module_id,
                "moduleName": result.module_name,
                "status": result.status,
                "error": result.error,
                "duration": result.duration.as_millis() as u64,
                "attempts": result.attempts,
            }),
        );
    }

    async fn ensure_browser(&self) -> anyhow::Result<()> {
        if self.browser.is_initialized() {
            return Ok(());
        }
        let _guard = self.browser_init.lock().await;
        if !self.browser.is_initialized() {
            self.browser.initialize().await?;
        }
        Ok(())
    }

    fn context(&self, shared_state: Option<SharedState>) -> ModuleContext {
        ModuleContext {
            config: Arc::clone(&self.config),
            browser: Arc::clone(&self.browser),
            shared_state,
        }
    }

    // ------------------------------------------------------------------
    // Suite execution / 套件执行
    // ------------------------------------------------------------------

    /// Runs a suite under `mode`.
    ///
    /// * `Sequential` - list order; `stop_on_failure` drops the rest after a failure.
    /// * `Parallel` - all at once; results in list order.
    /// * `LimitedParallel` - at most `concurrency` in flight; results in completion order.
    ///
    /// A failing setup or teardown hook aborts the suite, which then reports a
    /// single synthetic failed result.
    ///
    /// 以 `mode` 模式运行套件。
    /// setup 或 teardown 钩子失败会中止套件，此时只报告一个合成的失败结果。
    pub async fn execute_suite(&self, suite_id: &str, mode: ExecutionMode) -> Vec<ExecutionResult> {
        let Some(suite) = self.suites.get(suite_id) else {
            tracing::warn!(suite_id, "suite not found");
            return vec![ExecutionResult::synthetic_failure(
                suite_id,
                suite_id,
                format!("Suite {suite_id} not found"),
            )];
        };

        self.events.emit(
            EventKind::SuiteStarted,
            json!({
                "suiteId": suite.id,
                "suiteName": suite.name,
                "mode": mode.as_str(),
                "moduleCount": suite.module_ids.len(),
            }),
        );

        let shared: SharedState = Arc::default();
        let ctx = self.context(Some(Arc::clone(&shared)));

        if let Some(setup) = &suite.setup {
            if let Err(e) = run_hook(setup, ctx.clone()).await {
                return self.abort_suite(suite, format!("Suite setup failed: {e:#}"));
            }
            self.events
                .emit(EventKind::SuiteSetupComplete, json!({ "suiteId": suite.id }));
        }

        let results = match mode {
            ExecutionMode::Sequential => self.run_sequential(suite, &shared).await,
            ExecutionMode::Parallel => {
                let futures: Vec<_> = suite
                    .module_ids
                    .iter()
                    .map(|id| self.run_module(id, Some(Arc::clone(&shared))))
                    .collect();
                join_all(futures).await
            }
            ExecutionMode::LimitedParallel => {
                // Collected first so the suite future stays `Send`; futures are lazy,
                // buffer_unordered still polls at most `concurrency` of them.
                let futures: Vec<_> = suite
                    .module_ids
                    .iter()
                    .map(|id| self.run_module(id, Some(Arc::clone(&shared))))
                    .collect();
                stream::iter(futures)
                    .buffer_unordered(self.config.concurrency.max(1))
                    .collect::<Vec<_>>()
                    .await
            }
        };

        if let Some(teardown) = &suite.teardown {
            if let Err(e) = run_hook(teardown, ctx).await {
                return self.abort_suite(suite, format!("Suite teardown failed: {e:#}"));
            }
            self.events
                .emit(EventKind::SuiteTeardownComplete, json!({ "suiteId": suite.id }));
        }

        let summary = Summary::from_results(&results);
        self.events.emit(
            EventKind::SuiteCompleted,
            json!({
                "suiteId": suite.id,
                "total": summary.total,
                "passed": summary.passed,
                "failed": summary.failed,
                "skipped": summary.skipped,
            }),
        );
        results
    }

    async fn run_sequential(&self, suite: &Suite, shared: &SharedState) -> Vec<ExecutionResult> {
        let mut results = Vec::with_capacity(suite.module_ids.len());
        for id in &suite.module_ids {
            let result = self.run_module(id, Some(Arc::clone(shared))).await;
            let failed = result.is_failure();
            results.push(result);
            if failed && suite.stop_on_failure {
                tracing::info!(suite_id = %suite.id, module_id = %id, "stopping suite after failure");
                break;
            }
        }
        results
    }

    fn abort_suite(&self, suite: &Suite, error: String) -> Vec<ExecutionResult> {
        tracing::error!(suite_id = %suite.id, %error, "suite aborted");
        self.events.emit(
            EventKind::SuiteFailed,
            json!({ "suiteId": suite.id, "error": error }),
        );
        vec![ExecutionResult::synthetic_failure(&suite.id, &suite.name, error)]
    }

    // ------------------------------------------------------------------
    // Monitoring / 监控
    // ------------------------------------------------------------------

    /// Runs `suite_id` sequentially every `interval` until [`stop_monitoring`]
    /// is called, then resolves with the number of completed cycles. A cycle in
    /// progress always finishes; a stop request during the pause ends the loop
    /// immediately.
    ///
    /// 每隔 `interval` 顺序运行一次 `suite_id`，直到调用 [`stop_monitoring`]，
    /// 然后返回已完成的周期数。正在进行的周期总会完成；在等待期间发出的停止请求
    /// 会立即结束循环。
    ///
    /// [`stop_monitoring`]: ExecutionEngine::stop_monitoring
    pub async fn start_monitoring(&self, suite_id: &str, interval: Duration) -> Result<u64, EngineError> {
        if !self.suites.contains_key(suite_id) {
            return Err(EngineError::SuiteNotFound(suite_id.to_string()));
        }

        let token = {
            let mut slot = self.monitor.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(active) = slot.as_ref() {
                return Err(EngineError::MonitoringActive {
                    suite_id: active.suite_id.clone(),
                });
            }
            let token = CancellationToken::new();
            *slot = Some(ActiveMonitor {
                suite_id: suite_id.to_string(),
                token: token.clone(),
            });
            token
        };
        let _slot = MonitorSlot(&self.monitor);

        tracing::info!(suite_id, interval_secs = interval.as_secs_f64(), "monitoring started");
        self.events.emit(
            EventKind::MonitoringStarted,
            json!({ "suiteId": suite_id, "intervalSeconds": interval.as_secs_f64() }),
        );

        let mut cycles = 0u64;
        while !token.is_cancelled() {
            let results = self.execute_suite(suite_id, ExecutionMode::Sequential).await;
            cycles += 1;
            let summary = Summary::from_results(&results);

            self.events.emit(
                EventKind::MonitoringCycleCompleted,
                json!({
                    "suiteId": suite_id,
                    "cycle": cycles,
                    "summary": serde_json::to_value(&summary).unwrap_or_default(),
                }),
            );

            if summary.failed > 0 {
                let failures: Vec<_> = results
                    .iter()
                    .filter(|r| r.is_failure())
                    .map(|r| json!({ "moduleId": r.module_id, "error": r.error }))
                    .collect();
                self.events.emit(
                    EventKind::MonitoringFailuresDetected,
                    json!({ "suiteId": suite_id, "cycle": cycles, "failures": failures }),
                );
            }

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        tracing::info!(suite_id, cycles, "monitoring stopped");
        self.events.emit(
            EventKind::MonitoringStopped,
            json!({ "suiteId": suite_id, "cycles": cycles }),
        );
        Ok(cycles)
    }

    /// Requests the monitoring loop to stop. Returns `false` if none is running.
    /// 请求停止监控循环。如果没有正在运行的监控则返回 `false`。
    pub fn stop_monitoring(&self) -> bool {
        let slot = self.monitor.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(active) => {
                active.token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    // ------------------------------------------------------------------
    // Cleanup / 清理
    // ------------------------------------------------------------------

    /// Stops monitoring, releases the browser session, clears the registries
    /// and finally the event handlers. A repeated call only drops handlers
    /// subscribed since the last cleanup; it emits nothing.
    ///
    /// 停止监控、释放浏览器会话、清空注册表，最后清除事件处理器。
    /// 重复调用只会移除上次清理后订阅的处理器，不会发出事件。
    pub async fn cleanup(&mut self) {
        self.stop_monitoring();
        if self.cleaned_up {
            tracing::debug!("engine already cleaned up");
            self.events.clear();
            return;
        }
        self.cleaned_up = true;

        if self.browser.is_initialized() {
            if let Err(e) = self.browser.cleanup().await {
                tracing::warn!(error = %e, "failed to release browser session");
            }
        }
        self.modules.clear();
        self.suites.clear();
        self.events.emit(EventKind::EngineCleanupComplete, json!({}));
        self.events.clear();
    }
}

async fn run_hook(hook: &SuiteHook, ctx: ModuleContext) -> anyhow::Result<()> {
    match AssertUnwindSafe(hook(ctx)).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => Err(anyhow::anyhow!(panic_message(panic.as_ref()))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("Module panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("Module panicked: {s}")
    } else {
        "Module panicked".to_string()
    }
}
