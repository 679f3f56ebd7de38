//! # Event Bus Module / 事件总线模块
//!
//! A per-engine publish/subscribe channel for lifecycle notifications.
//! Handlers run synchronously in subscription order: first those registered for
//! the event's kind, then the wildcard handlers. A handler that fails or panics
//! is logged and never affects the emitter or the other handlers.
//!
//! 每个引擎独立的生命周期通知发布/订阅通道。
//! 处理器按订阅顺序同步运行：先运行为该事件类型注册的处理器，再运行通配处理器。
//! 失败或 panic 的处理器只会被记录日志，不会影响发出者或其他处理器。

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, RwLock};

/// The catalog of events the engine emits.
/// 引擎发出的事件目录。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ModuleRegistered,
    SuiteRegistered,
    ModuleStarted,
    ModuleCompleted,
    ModuleFailed,
    ModuleRetry,
    SuiteStarted,
    SuiteSetupComplete,
    SuiteTeardownComplete,
    SuiteCompleted,
    SuiteFailed,
    MonitoringStarted,
    MonitoringCycleCompleted,
    MonitoringFailuresDetected,
    MonitoringStopped,
    EngineCleanupComplete,
}

impl EventKind {
    pub const ALL: [EventKind; 16] = [
        EventKind::ModuleRegistered,
        EventKind::SuiteRegistered,
        EventKind::ModuleStarted,
        EventKind::ModuleCompleted,
        EventKind::ModuleFailed,
        EventKind::ModuleRetry,
        EventKind::SuiteStarted,
        EventKind::SuiteSetupComplete,
        EventKind::SuiteTeardownComplete,
        EventKind::SuiteCompleted,
        EventKind::SuiteFailed,
        EventKind::MonitoringStarted,
        EventKind::MonitoringCycleCompleted,
        EventKind::MonitoringFailuresDetected,
        EventKind::MonitoringStopped,
        EventKind::EngineCleanupComplete,
    ];

    /// The wire name of the event, e.g. `module:started`.
    /// 事件的名称，例如 `module:started`。
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ModuleRegistered => "module:registered",
            EventKind::SuiteRegistered => "suite:registered",
            EventKind::ModuleStarted => "module:started",
            EventKind::ModuleCompleted => "module:completed",
            EventKind::ModuleFailed => "module:failed",
            EventKind::ModuleRetry => "module:retry",
            EventKind::SuiteStarted => "suite:started",
            EventKind::SuiteSetupComplete => "suite:setup:complete",
            EventKind::SuiteTeardownComplete => "suite:teardown:complete",
            EventKind::SuiteCompleted => "suite:completed",
            EventKind::SuiteFailed => "suite:failed",
            EventKind::MonitoringStarted => "monitoring:started",
            EventKind::MonitoringCycleCompleted => "monitoring:cycle:completed",
            EventKind::MonitoringFailuresDetected => "monitoring:failures:detected",
            EventKind::MonitoringStopped => "monitoring:stopped",
            EventKind::EngineCleanupComplete => "engine:cleanup:complete",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One emitted event. `data` is the kind-specific payload.
/// 一个已发出的事件。`data` 是与类型相关的负载。
#[derive(Debug, Clone, Serialize)]
pub struct EngineEvent {
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
    pub data: serde_json::Value,
}

impl EngineEvent {
    pub fn new(kind: EventKind, data: serde_json::Value) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
            data,
        }
    }
}

pub type EventHandler = Arc<dyn Fn(&EngineEvent) -> anyhow::Result<()> + Send + Sync>;

#[derive(Default)]
struct Subscribers {
    by_kind: HashMap<EventKind, Vec<EventHandler>>,
    wildcard: Vec<EventHandler>,
}

/// Publish/subscribe bus owned by one engine instance.
/// 由单个引擎实例拥有的发布/订阅总线。
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<RwLock<Subscribers>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.handler_count())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `handler` to one event kind.
    /// 为某一事件类型订阅 `handler`。
    pub fn on<F>(&self, kind: EventKind, handler: F)
    where
        F: Fn(&EngineEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        if let Ok(mut subs) = self.subscribers.write() {
            subs.by_kind.entry(kind).or_default().push(Arc::new(handler));
        }
    }

    /// Subscribes `handler` to every event.
    /// 为所有事件订阅 `handler`。
    pub fn on_any<F>(&self, handler: F)
    where
        F: Fn(&EngineEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        if let Ok(mut subs) = self.subscribers.write() {
            subs.wildcard.push(Arc::new(handler));
        }
    }

    /// Delivers an event to the kind's handlers, then to the wildcard handlers.
    /// 将事件依次投递给该类型的处理器和通配处理器。
    pub fn emit(&self, kind: EventKind, data: serde_json::Value) {
        let event = EngineEvent::new(kind, data);
        // Handlers are cloned out so a handler may subscribe without deadlocking.
        let handlers: Vec<EventHandler> = match self.subscribers.read() {
            Ok(subs) => subs
                .by_kind
                .get(&kind)
                .into_iter()
                .flatten()
                .chain(subs.wildcard.iter())
                .cloned()
                .collect(),
            Err(_) => return,
        };

        tracing::trace!(event = %kind, handlers = handlers.len(), "emitting event");
        for handler in handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(&event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::error!(event = %kind, error = %e, "event handler failed");
                }
                Err(_) => {
                    tracing::error!(event = %kind, "event handler panicked");
                }
            }
        }
    }

    /// Removes every handler.
    /// 移除所有处理器。
    pub fn clear(&self) {
        if let Ok(mut subs) = self.subscribers.write() {
            subs.by_kind.clear();
            subs.wildcard.clear();
        }
    }

    pub fn handler_count(&self) -> usize {
        self.subscribers
            .read()
            .map(|subs| subs.by_kind.values().map(Vec::len).sum::<usize>() + subs.wildcard.len())
            .unwrap_or(0)
    }
}

