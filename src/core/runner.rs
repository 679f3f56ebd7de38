//! # Test Runner Module / 测试运行器模块
//!
//! The test runner wraps an [`ExecutionEngine`] and turns every invocation into
//! exactly one timestamped [`RunReport`]. It also selects modules with a
//! [`TestFilter`] and forwards monitoring control to the engine.
//!
//! 测试运行器封装了 [`ExecutionEngine`]，并将每次调用转换为唯一一个带时间戳的
//! [`RunReport`]。它还使用 [`TestFilter`] 选择模块，并将监控控制转发给引擎。

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::core::events::EventKind;
use crate::core::execution::{EngineError, ExecutionEngine};
use crate::core::models::{ExecutionMode, ExecutionResult, RunReport, Summary, TestFilter};
use crate::core::planner::{self, SelectionPlan};

/// Runs modules and suites through the engine and reports on each run.
/// 通过引擎运行模块和套件，并为每次运行生成报告。
#[derive(Debug)]
pub struct TestRunner {
    engine: ExecutionEngine,
    default_filter: Option<TestFilter>,
    current_run: Mutex<Option<RunReport>>,
    monitoring_handlers_attached: AtomicBool,
}

impl TestRunner {
    pub fn new(engine: ExecutionEngine) -> Self {
        Self {
            engine,
            default_filter: None,
            current_run: Mutex::new(None),
            monitoring_handlers_attached: AtomicBool::new(false),
        }
    }

    /// Sets the filter `run_all` falls back to when none is given.
    /// 设置 `run_all` 在未提供过滤器时使用的默认过滤器。
    pub fn with_filter(mut self, filter: TestFilter) -> Self {
        self.default_filter = Some(filter);
        self
    }

    pub fn engine(&self) -> &ExecutionEngine {
        &self.engine
    }

    /// Mutable access for the registration phase.
    /// 注册阶段的可变访问。
    pub fn engine_mut(&mut self) -> &mut ExecutionEngine {
        &mut self.engine
    }

    /// The report of the most recent run, if any.
    /// 最近一次运行的报告（如果有）。
    pub fn current_run(&self) -> Option<RunReport> {
        self.current_run
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Applies `filter` to the registry. `None` selects every module.
    /// 将 `filter` 应用于注册表。`None` 选择所有模块。
    pub fn plan(&self, filter: Option<&TestFilter>) -> SelectionPlan {
        planner::plan_selection(self.engine.modules(), filter)
    }

    /// Ids of the modules matching `filter`, in registry order.
    /// 匹配 `filter` 的模块 id，按注册表顺序。
    pub fn get_filtered_modules(&self, filter: Option<&TestFilter>) -> Vec<String> {
        self.plan(filter).module_ids
    }

    pub async fn run_module(&self, module_id: &str) -> RunReport {
        let (start_time, started) = (Utc::now(), Instant::now());
        let result = self.engine.execute_module(module_id).await;
        self.create_report(vec![result], start_time, started.elapsed(), None)
    }

    pub async fn run_suite(&self, suite_id: &str, mode: ExecutionMode) -> RunReport {
        let (start_time, started) = (Utc::now(), Instant::now());
        let results = self.engine.execute_suite(suite_id, mode).await;
        self.create_report(results, start_time, started.elapsed(), None)
    }

    /// Runs each suite in turn and concatenates the results in suite order.
    /// 依次运行每个套件，并按套件顺序拼接结果。
    pub async fn run_suites<S: AsRef<str>>(&self, suite_ids: &[S], mode: ExecutionMode) -> RunReport {
        let (start_time, started) = (Utc::now(), Instant::now());
        let mut results = Vec::new();
        for suite_id in suite_ids {
            results.extend(self.engine.execute_suite(suite_id.as_ref(), mode).await);
        }
        self.create_report(results, start_time, started.elapsed(), None)
    }

    /// Runs every module matching `filter` (or the runner's default filter)
    /// sequentially, stopping at the first failure unless
    /// `continue_on_failure` is set.
    ///
    /// 顺序运行所有匹配 `filter`（或运行器默认过滤器）的模块，
    /// 除非设置了 `continue_on_failure`，否则在第一次失败时停止。
    pub async fn run_all(&self, filter: Option<TestFilter>) -> RunReport {
        let (start_time, started) = (Utc::now(), Instant::now());
        let filter = filter.or_else(|| self.default_filter.clone());
        let plan = self.plan(filter.as_ref());
        let continue_on_failure = self.engine.config().continue_on_failure;

        let mut results = Vec::with_capacity(plan.module_ids.len());
        for module_id in &plan.module_ids {
            let result = self.engine.execute_module(module_id).await;
            let failed = result.is_failure();
            results.push(result);
            if failed && !continue_on_failure {
                tracing::info!(module_id = %module_id, "stopping run after failure");
                break;
            }
        }
        self.create_report(results, start_time, started.elapsed(), filter)
    }

    /// Runs every listed module in order, without stopping early.
    /// 按顺序运行列出的每个模块，不会提前停止。
    pub async fn run_modules<S: AsRef<str>>(&self, module_ids: &[S]) -> RunReport {
        let (start_time, started) = (Utc::now(), Instant::now());
        let mut results = Vec::with_capacity(module_ids.len());
        for module_id in module_ids {
            results.push(self.engine.execute_module(module_id.as_ref()).await);
        }
        self.create_report(results, start_time, started.elapsed(), None)
    }

    /// Builds the report for one run and stores it as the current run.
    /// 为一次运行构建报告并将其保存为当前运行。
    pub fn create_report(
        &self,
        results: Vec<ExecutionResult>,
        start_time: DateTime<Utc>,
        duration: Duration,
        filter: Option<TestFilter>,
    ) -> RunReport {
        let report = RunReport {
            summary: Summary::from_results(&results),
            results,
            start_time,
            end_time: Utc::now(),
            duration,
            config: self.engine.config().clone(),
            filter,
        };
        tracing::info!(
            total = report.summary.total,
            passed = report.summary.passed,
            failed = report.summary.failed,
            skipped = report.summary.skipped,
            "run finished"
        );
        *self.current_run.lock().unwrap_or_else(PoisonError::into_inner) = Some(report.clone());
        report
    }

    /// Starts the engine's monitoring loop for `suite_id`; resolves when it stops.
    /// 为 `suite_id` 启动引擎的监控循环；在其停止时返回。
    pub async fn start_monitoring(&self, suite_id: &str, interval: Duration) -> Result<u64, EngineError> {
        self.attach_monitoring_handlers();
        self.engine.start_monitoring(suite_id, interval).await
    }

    pub fn stop_monitoring(&self) -> bool {
        self.engine.stop_monitoring()
    }

    fn attach_monitoring_handlers(&self) {
        if self.monitoring_handlers_attached.swap(true, Ordering::SeqCst) {
            return;
        }
        let events = self.engine.events();
        events.on(EventKind::MonitoringCycleCompleted, |event| {
            tracing::info!(
                suite_id = %event.data["suiteId"],
                cycle = %event.data["cycle"],
                passed = %event.data["summary"]["passed"],
                failed = %event.data["summary"]["failed"],
                "monitoring cycle completed"
            );
            Ok(())
        });
        events.on(EventKind::MonitoringFailuresDetected, |event| {
            let failures = event.data["failures"].as_array().map_or(0, Vec::len);
            tracing::warn!(
                suite_id = %event.data["suiteId"],
                cycle = %event.data["cycle"],
                failures,
                "monitoring detected failures"
            );
            Ok(())
        });
    }

    /// Releases the engine's resources. Safe to call more than once.
    /// 释放引擎的资源。可以安全地多次调用。
    pub async fn cleanup(&mut self) {
        self.engine.cleanup().await;
        self.monitoring_handlers_attached.store(false, Ordering::SeqCst);
    }
}
