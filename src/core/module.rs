//! # Module Contract Module / 模块契约模块
//!
//! The single internal contract every module satisfies once it has passed
//! through the adapter, plus suites and the context handed to both.
//!
//! 每个模块经过适配器后都满足的唯一内部契约，以及套件和传递给二者的上下文。

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::core::config::RunnerConfig;
use crate::core::models::{ModuleOutcome, duration_ms};
use crate::infra::browser::BrowserSession;

/// State shared by every module and hook of one suite execution.
/// 同一次套件执行中所有模块和钩子共享的状态。
pub type SharedState = Arc<Mutex<serde_json::Map<String, serde_json::Value>>>;

/// Declared metadata of a module. Immutable once registered.
/// 模块声明的元数据。注册后不可变。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub enabled: bool,
    /// Advisory; consumed by whoever executes the module, never by the scheduler.
    /// 仅供参考；由执行模块的一方使用，调度器不使用。
    #[serde(with = "duration_ms")]
    pub timeout: Duration,
    pub retry_on_failure: bool,
}

impl ModuleInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            category: "GENERAL".to_string(),
            tags: Vec::new(),
            enabled: true,
            timeout: Duration::from_secs(30),
            retry_on_failure: false,
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn retry_on_failure(mut self, retry: bool) -> Self {
        self.retry_on_failure = retry;
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Everything a module receives when it runs.
/// 模块运行时接收的全部内容。
#[derive(Clone)]
pub struct ModuleContext {
    pub config: Arc<RunnerConfig>,
    pub browser: Arc<dyn BrowserSession>,
    /// Present when the module runs as part of a suite.
    /// 当模块作为套件的一部分运行时存在。
    pub shared_state: Option<SharedState>,
}

impl fmt::Debug for ModuleContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleContext")
            .field("config", &self.config)
            .field("browser_initialized", &self.browser.is_initialized())
            .field("shared_state", &self.shared_state.is_some())
            .finish()
    }
}

/// The internal module contract. Returning `Err` (or panicking) counts as a
/// failed attempt; it never escapes the engine.
///
/// 内部模块契约。返回 `Err`（或 panic）视为一次失败的尝试；它永远不会逃逸出引擎。
#[async_trait]
pub trait Module: Send + Sync {
    fn info(&self) -> &ModuleInfo;

    async fn execute(&self, ctx: &ModuleContext) -> anyhow::Result<ModuleOutcome>;
}

pub type ModuleRef = Arc<dyn Module>;

/// A suite setup or teardown hook.
/// 套件的 setup 或 teardown 钩子。
pub type SuiteHook = Arc<dyn Fn(ModuleContext) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// An ordered collection of module references sharing hooks.
/// 共享钩子的有序模块引用集合。
#[derive(Clone)]
pub struct Suite {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Referenced by value; resolved at execution time.
    /// 按值引用；在执行时解析。
    pub module_ids: Vec<String>,
    pub setup: Option<SuiteHook>,
    pub teardown: Option<SuiteHook>,
    pub stop_on_failure: bool,
}

impl Suite {
    pub fn new<I, S>(id: impl Into<String>, name: impl Into<String>, module_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            module_ids: module_ids.into_iter().map(Into::into).collect(),
            setup: None,
            teardown: None,
            stop_on_failure: false,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn stop_on_failure(mut self, stop: bool) -> Self {
        self.stop_on_failure = stop;
        self
    }

    pub fn with_setup<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(ModuleContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let boxed: SuiteHook = Arc::new(move |ctx| -> BoxFuture<'static, anyhow::Result<()>> {
            Box::pin(hook(ctx))
        });
        self.setup = Some(boxed);
        self
    }

    pub fn with_teardown<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(ModuleContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let boxed: SuiteHook = Arc::new(move |ctx| -> BoxFuture<'static, anyhow::Result<()>> {
            Box::pin(hook(ctx))
        });
        self.teardown = Some(boxed);
        self
    }
}

impl fmt::Debug for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suite")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("module_ids", &self.module_ids)
            .field("has_setup", &self.setup.is_some())
            .field("has_teardown", &self.teardown.is_some())
            .field("stop_on_failure", &self.stop_on_failure)
            .finish()
    }
}
