//! # Browser Collaborator Module / 浏览器协作者模块
//!
//! The engine only needs a small lifecycle surface from the browser automation
//! layer: initialize, is-initialized, get-page and cleanup. Everything richer
//! (navigation, clicks, screenshots) is used by module authors directly.
//!
//! 引擎只需要浏览器自动化层的一个小型生命周期接口：
//! 初始化、是否已初始化、获取页面和清理。更丰富的操作（导航、点击、截图）
//! 由模块作者直接使用。

use anyhow::{Result, bail};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// A handle to the page shared by every module of one engine.
/// 同一引擎所有模块共享的页面句柄。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHandle {
    /// Distinguishes one initialization of the session from the next.
    pub session_id: u64,
    pub base_url: String,
    pub headless: bool,
}

/// Lifecycle capability consumed by the execution engine.
/// 执行引擎使用的生命周期能力。
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn initialize(&self) -> Result<()>;

    async fn cleanup(&self) -> Result<()>;

    fn is_initialized(&self) -> bool;

    /// The current page. Fails if the session is not initialized.
    /// 当前页面。如果会话未初始化则失败。
    fn page(&self) -> Result<PageHandle>;
}

/// In-process session that tracks lifecycle state and hands out a page handle.
/// Used when no real automation backend is plugged in.
///
/// 进程内会话，跟踪生命周期状态并提供页面句柄。
/// 在未接入真实自动化后端时使用。
#[derive(Debug)]
pub struct HeadlessSession {
    base_url: String,
    headless: bool,
    initialized: AtomicBool,
    session_id: AtomicU64,
}

impl HeadlessSession {
    pub fn new(base_url: impl Into<String>, headless: bool) -> Self {
        Self {
            base_url: base_url.into(),
            headless,
            initialized: AtomicBool::new(false),
            session_id: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl BrowserSession for HeadlessSession {
    async fn initialize(&self) -> Result<()> {
        if !self.initialized.swap(true, Ordering::SeqCst) {
            let id = self.session_id.fetch_add(1, Ordering::SeqCst) + 1;
            tracing::debug!(session_id = id, base_url = %self.base_url, "browser session initialized");
        }
        Ok(())
    }

    async fn cleanup(&self) -> Result<()> {
        if self.initialized.swap(false, Ordering::SeqCst) {
            tracing::debug!("browser session released");
        }
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn page(&self) -> Result<PageHandle> {
        if !self.is_initialized() {
            bail!("Browser session is not initialized");
        }
        Ok(PageHandle {
            session_id: self.session_id.load(Ordering::SeqCst),
            base_url: self.base_url.clone(),
            headless: self.headless,
        })
    }
}
