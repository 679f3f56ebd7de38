// Shared test helpers for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use bot_runner::config::{ReportingConfig, RunnerConfig};
use bot_runner::core::{Module, ModuleContext, ModuleInfo, ModuleOutcome, ModuleRef};
use bot_runner::models::{ExecutionResult, RunReport, Summary};
use chrono::Utc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A config with short retry delays and no report output directory.
pub fn fast_config() -> RunnerConfig {
    RunnerConfig {
        max_retries: 2,
        retry_delay_ms: 5,
        concurrency: 2,
        reporting: ReportingConfig {
            output_dir: None,
            ..ReportingConfig::default()
        },
        ..RunnerConfig::default()
    }
}

/// Returns the same outcome on every attempt, after an optional delay.
pub struct StaticModule {
    info: ModuleInfo,
    outcome: ModuleOutcome,
    delay: Duration,
    pub calls: Arc<AtomicU32>,
}

impl StaticModule {
    pub fn new(info: ModuleInfo, outcome: ModuleOutcome) -> Self {
        Self {
            info,
            outcome,
            delay: Duration::ZERO,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn passing(id: &str) -> Self {
        Self::new(ModuleInfo::new(id, id.to_uppercase()), ModuleOutcome::success())
    }

    pub fn failing(id: &str) -> Self {
        Self::new(
            ModuleInfo::new(id, id.to_uppercase()),
            ModuleOutcome::failed(format!("{id} is broken")),
        )
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn into_ref(self) -> (ModuleRef, Arc<AtomicU32>) {
        let calls = Arc::clone(&self.calls);
        (Arc::new(self), calls)
    }
}

#[async_trait]
impl Module for StaticModule {
    fn info(&self) -> &ModuleInfo {
        &self.info
    }

    async fn execute(&self, _ctx: &ModuleContext) -> anyhow::Result<ModuleOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.outcome.clone())
    }
}

/// Fails (by returning `Err`) for the first `failures` attempts, then succeeds.
pub struct FlakyModule {
    info: ModuleInfo,
    failures: u32,
    pub attempts: Arc<AtomicU32>,
}

impl FlakyModule {
    pub fn new(id: &str, failures: u32) -> Self {
        Self {
            info: ModuleInfo::new(id, id).retry_on_failure(true),
            failures,
            attempts: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn into_ref(self) -> (ModuleRef, Arc<AtomicU32>) {
        let attempts = Arc::clone(&self.attempts);
        (Arc::new(self), attempts)
    }
}

#[async_trait]
impl Module for FlakyModule {
    fn info(&self) -> &ModuleInfo {
        &self.info
    }

    async fn execute(&self, _ctx: &ModuleContext) -> anyhow::Result<ModuleOutcome> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.failures {
            anyhow::bail!("attempt {attempt} failed");
        }
        Ok(ModuleOutcome::success())
    }
}

/// Tracks how many executions overlap.
#[derive(Clone, Default)]
pub struct ConcurrencyGauge {
    in_flight: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
    pub finished: Arc<Mutex<Vec<String>>>,
}

pub struct GaugedModule {
    info: ModuleInfo,
    gauge: ConcurrencyGauge,
    delay: Duration,
}

impl ConcurrencyGauge {
    pub fn module(&self, id: &str, delay: Duration) -> ModuleRef {
        Arc::new(GaugedModule {
            info: ModuleInfo::new(id, id),
            gauge: self.clone(),
            delay,
        })
    }

    pub fn max(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> Vec<String> {
        self.finished.lock().unwrap().clone()
    }
}

#[async_trait]
impl Module for GaugedModule {
    fn info(&self) -> &ModuleInfo {
        &self.info
    }

    async fn execute(&self, _ctx: &ModuleContext) -> anyhow::Result<ModuleOutcome> {
        let now = self.gauge.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.gauge.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.gauge.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.gauge.finished.lock().unwrap().push(self.info.id.clone());
        Ok(ModuleOutcome::success())
    }
}

pub fn result(id: &str, outcome: ModuleOutcome, millis: u64) -> ExecutionResult {
    ExecutionResult::from_outcome(id, &id.to_uppercase(), outcome, Duration::from_millis(millis), 1)
}

/// A report over `results` with the default configuration.
pub fn report_of(results: Vec<ExecutionResult>) -> RunReport {
    let now = Utc::now();
    RunReport {
        summary: Summary::from_results(&results),
        results,
        start_time: now,
        end_time: now,
        duration: Duration::from_millis(1500),
        config: fast_config(),
        filter: None,
    }
}

/// A report whose success rate is `passed * 10` percent (out of 10 results).
pub fn report_with_rate(passed: usize) -> RunReport {
    let results = (0..10)
        .map(|i| {
            let outcome = if i < passed {
                ModuleOutcome::success()
            } else {
                ModuleOutcome::failed("boom")
            };
            result(&format!("m{i}"), outcome, 10)
        })
        .collect();
    report_of(results)
}
