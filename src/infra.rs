//! # Infrastructure Module / 基础设施模块
//!
//! This module provides infrastructure services for Bot Runner,
//! including the browser collaborator, command execution, file system
//! operations, retry helpers, logging and i18n support.
//!
//! 此模块为 Bot Runner 提供基础设施服务，
//! 包括浏览器协作者、命令执行、文件系统操作、重试辅助、日志和国际化支持。

pub mod browser;
pub mod command;
pub mod fs;
pub mod logging;
pub mod retry;

// Re-export i18n functions for easier access
pub use rust_i18n::t;
