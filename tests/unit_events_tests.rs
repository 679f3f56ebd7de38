//! # Event Bus Unit Tests / 事件总线单元测试
//!
//! Delivery order, wildcard subscriptions and handler isolation.
//!
//! 投递顺序、通配订阅和处理器隔离。

use bot_runner::core::events::{EventBus, EventKind};
use serde_json::json;
use std::sync::{Arc, Mutex};

fn recorder() -> (Arc<Mutex<Vec<String>>>, Arc<Mutex<Vec<String>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    (Arc::clone(&log), log)
}

#[cfg(test)]
mod delivery_tests {
    use super::*;

    #[test]
    fn test_typed_handlers_run_before_wildcard_handlers() {
        let bus = EventBus::new();
        let (log, sink) = recorder();

        let s = Arc::clone(&sink);
        bus.on_any(move |_| {
            s.lock().unwrap().push("wildcard".to_string());
            Ok(())
        });
        let s = Arc::clone(&sink);
        bus.on(EventKind::ModuleStarted, move |_| {
            s.lock().unwrap().push("first".to_string());
            Ok(())
        });
        let s = Arc::clone(&sink);
        bus.on(EventKind::ModuleStarted, move |_| {
            s.lock().unwrap().push("second".to_string());
            Ok(())
        });

        bus.emit(EventKind::ModuleStarted, json!({ "moduleId": "a" }));

        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "wildcard"]);
    }

    #[test]
    fn test_handlers_only_receive_their_kind() {
        let bus = EventBus::new();
        let (log, sink) = recorder();
        bus.on(EventKind::SuiteCompleted, move |event| {
            sink.lock().unwrap().push(event.data["suiteId"].as_str().unwrap().to_string());
            Ok(())
        });

        bus.emit(EventKind::SuiteStarted, json!({ "suiteId": "ignored" }));
        bus.emit(EventKind::SuiteCompleted, json!({ "suiteId": "smoke" }));

        assert_eq!(*log.lock().unwrap(), vec!["smoke"]);
    }

    #[test]
    fn test_wildcard_sees_event_kind_and_payload() {
        let bus = EventBus::new();
        let (log, sink) = recorder();
        bus.on_any(move |event| {
            sink.lock()
                .unwrap()
                .push(format!("{}={}", event.kind, event.data["n"]));
            Ok(())
        });

        bus.emit(EventKind::MonitoringStarted, json!({ "n": 1 }));
        bus.emit(EventKind::MonitoringStopped, json!({ "n": 2 }));

        assert_eq!(
            *log.lock().unwrap(),
            vec!["monitoring:started=1", "monitoring:stopped=2"]
        );
    }

    #[test]
    fn test_handler_may_subscribe_while_handling() {
        let bus = EventBus::new();
        let inner = bus.clone();
        bus.on(EventKind::ModuleRegistered, move |_| {
            inner.on(EventKind::ModuleStarted, |_| Ok(()));
            Ok(())
        });

        bus.emit(EventKind::ModuleRegistered, json!({}));

        assert_eq!(bus.handler_count(), 2);
    }

    #[test]
    fn test_clear_removes_all_handlers() {
        let bus = EventBus::new();
        bus.on(EventKind::ModuleStarted, |_| Ok(()));
        bus.on_any(|_| Ok(()));
        assert_eq!(bus.handler_count(), 2);

        bus.clear();
        assert_eq!(bus.handler_count(), 0);
    }
}

#[cfg(test)]
mod isolation_tests {
    use super::*;

    #[test]
    fn test_failing_handler_does_not_stop_siblings() {
        let bus = EventBus::new();
        let (log, sink) = recorder();

        bus.on(EventKind::ModuleFailed, |_| anyhow::bail!("handler exploded"));
        let s = Arc::clone(&sink);
        bus.on(EventKind::ModuleFailed, move |_| {
            s.lock().unwrap().push("sibling".to_string());
            Ok(())
        });
        bus.on_any(move |_| {
            sink.lock().unwrap().push("wildcard".to_string());
            Ok(())
        });

        bus.emit(EventKind::ModuleFailed, json!({}));

        assert_eq!(*log.lock().unwrap(), vec!["sibling", "wildcard"]);
    }

    #[test]
    fn test_panicking_handler_does_not_reach_emitter() {
        let bus = EventBus::new();
        let (log, sink) = recorder();

        bus.on(EventKind::SuiteFailed, |_| panic!("handler panicked"));
        bus.on(EventKind::SuiteFailed, move |_| {
            sink.lock().unwrap().push("after panic".to_string());
            Ok(())
        });

        bus.emit(EventKind::SuiteFailed, json!({}));
        bus.emit(EventKind::SuiteFailed, json!({}));

        assert_eq!(*log.lock().unwrap(), vec!["after panic", "after panic"]);
    }
}

#[cfg(test)]
mod naming_tests {
    use super::*;

    #[test]
    fn test_event_names_follow_catalog() {
        assert_eq!(EventKind::ModuleRetry.as_str(), "module:retry");
        assert_eq!(EventKind::SuiteSetupComplete.as_str(), "suite:setup:complete");
        assert_eq!(
            EventKind::MonitoringFailuresDetected.as_str(),
            "monitoring:failures:detected"
        );
        assert_eq!(EventKind::EngineCleanupComplete.to_string(), "engine:cleanup:complete");
    }

    #[test]
    fn test_every_kind_resolves_from_its_name() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(EventKind::from_name("module:exploded"), None);
    }
}
