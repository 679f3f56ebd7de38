//! # Core Module / 核心模块
//!
//! This module contains the core functionality of Bot Runner:
//! data models, configuration, the module contract and its adapter,
//! the event bus, the execution engine, module selection and the test runner.
//!
//! 此模块包含 Bot Runner 的核心功能：
//! 数据模型、配置、模块契约及其适配器、事件总线、执行引擎、模块选择和测试运行器。

pub mod adapter;
pub mod command_module;
pub mod config;
pub mod events;
pub mod execution;
pub mod models;
pub mod module;
pub mod planner;
pub mod runner;

// Re-exports
pub use execution::{EngineError, ExecutionEngine};
pub use models::{ExecutionMode, ExecutionResult, ModuleOutcome, ModuleStatus, RunReport, Summary, TestFilter};
pub use module::{Module, ModuleContext, ModuleInfo, ModuleRef, Suite};
pub use runner::TestRunner;
