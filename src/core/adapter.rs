//! # Module Adapter Module / 模块适配器模块
//!
//! Modules are authored in one of two shapes: a flat `execute` function, or a
//! tree of named test groups each holding test cases. Both are turned into the
//! single [`Module`] contract here, so the engine never branches on shape.
//!
//! 模块以两种形式之一编写：扁平的 `execute` 函数，或由命名测试组（每组包含测试用例）
//! 构成的树。二者都在这里转换为唯一的 [`Module`] 契约，因此引擎无需根据形式分支。

use anyhow::Result;
use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::json;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use crate::core::models::{ModuleOutcome, ModuleStatus};
use crate::core::module::{Module, ModuleContext, ModuleInfo, ModuleRef};

pub type ExecuteFn =
    Arc<dyn Fn(ModuleContext) -> BoxFuture<'static, Result<ModuleOutcome>> + Send + Sync>;

pub type TestFn = Arc<dyn Fn(ModuleContext) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// One test inside a group. Passing means `run` returned `Ok`.
/// 组内的一个测试。`run` 返回 `Ok` 即为通过。
#[derive(Clone)]
pub struct TestCase {
    pub name: String,
    pub skip: bool,
    run: TestFn,
}

impl TestCase {
    pub fn new<F, Fut>(name: impl Into<String>, run: F) -> Self
    where
        F: Fn(ModuleContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let run: TestFn = Arc::new(move |ctx| -> BoxFuture<'static, Result<()>> { Box::pin(run(ctx)) });
        Self {
            name: name.into(),
            skip: false,
            run,
        }
    }

    pub fn skip(mut self) -> Self {
        self.skip = true;
        self
    }
}

/// A named group of tests, run in order.
/// 按顺序运行的命名测试组。
#[derive(Clone)]
pub struct TestGroup {
    pub name: String,
    pub tests: Vec<TestCase>,
}

impl TestGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tests: Vec::new(),
        }
    }

    pub fn test(mut self, test: TestCase) -> Self {
        self.tests.push(test);
        self
    }
}

/// A module as its author wrote it.
/// 模块作者所编写的模块形式。
pub enum AuthoredModule {
    /// A single function producing the outcome directly.
    /// 直接产生结果的单个函数。
    Flat { info: ModuleInfo, execute: ExecuteFn },
    /// Groups of tests whose individual results are aggregated into one outcome.
    /// 多组测试，其各自结果被汇总为一个结果。
    Tree { info: ModuleInfo, groups: Vec<TestGroup> },
}

impl AuthoredModule {
    pub fn flat<F, Fut>(info: ModuleInfo, execute: F) -> Self
    where
        F: Fn(ModuleContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ModuleOutcome>> + Send + 'static,
    {
        let execute: ExecuteFn =
            Arc::new(move |ctx| -> BoxFuture<'static, Result<ModuleOutcome>> { Box::pin(execute(ctx)) });
        AuthoredModule::Flat { info, execute }
    }

    pub fn tree(info: ModuleInfo, groups: Vec<TestGroup>) -> Self {
        AuthoredModule::Tree { info, groups }
    }

    pub fn info(&self) -> &ModuleInfo {
        match self {
            AuthoredModule::Flat { info, .. } | AuthoredModule::Tree { info, .. } => info,
        }
    }

    /// Normalizes this module into the engine's contract.
    /// 将此模块规范化为引擎的契约。
    pub fn into_module(self) -> ModuleRef {
        match self {
            AuthoredModule::Flat { info, execute } => Arc::new(FlatModule { info, execute }),
            AuthoredModule::Tree { info, groups } => Arc::new(TreeModule { info, groups }),
        }
    }
}

/// Adapts a batch of authored modules.
/// 批量适配作者编写的模块。
pub fn adapt_modules<I>(modules: I) -> Vec<ModuleRef>
where
    I: IntoIterator<Item = AuthoredModule>,
{
    modules.into_iter().map(AuthoredModule::into_module).collect()
}

struct FlatModule {
    info: ModuleInfo,
    execute: ExecuteFn,
}

#[async_trait]
impl Module for FlatModule {
    fn info(&self) -> &ModuleInfo {
        &self.info
    }

    async fn execute(&self, ctx: &ModuleContext) -> Result<ModuleOutcome> {
        (self.execute)(ctx.clone()).await
    }
}

struct TreeModule {
    info: ModuleInfo,
    groups: Vec<TestGroup>,
}

#[async_trait]
impl Module for TreeModule {
    fn info(&self) -> &ModuleInfo {
        &self.info
    }

    async fn execute(&self, ctx: &ModuleContext) -> Result<ModuleOutcome> {
        let (mut passed, mut failed, mut skipped) = (0usize, 0usize, 0usize);
        let mut first_failure: Option<String> = None;
        let mut group_details = Vec::with_capacity(self.groups.len());

        for group in &self.groups {
            let mut test_details = Vec::with_capacity(group.tests.len());
            for test in &group.tests {
                if test.skip {
                    skipped += 1;
                    test_details.push(json!({ "name": test.name, "status": ModuleStatus::Skipped }));
                    continue;
                }

                let start = Instant::now();
                let error = match AssertUnwindSafe((test.run)(ctx.clone())).catch_unwind().await {
                    Ok(Ok(())) => None,
                    Ok(Err(e)) => Some(format!("{e:#}")),
                    Err(_) => Some("Test panicked".to_string()),
                };
                let duration = start.elapsed().as_millis() as u64;

                let status = if let Some(e) = &error {
                    failed += 1;
                    if first_failure.is_none() {
                        first_failure = Some(format!("{} > {}: {e}", group.name, test.name));
                    }
                    ModuleStatus::Failed
                } else {
                    passed += 1;
                    ModuleStatus::Success
                };
                test_details.push(json!({
                    "name": test.name,
                    "status": status,
                    "error": error,
                    "duration": duration,
                }));
            }
            group_details.push(json!({ "name": group.name, "tests": test_details }));
        }

        let total = passed + failed + skipped;
        let details = json!({
            "groups": group_details,
            "total": total,
            "passed": passed,
            "failed": failed,
            "skipped": skipped,
        });

        let outcome = match first_failure {
            Some(first) => ModuleOutcome::failed(format!("{failed} of {total} tests failed; first: {first}")),
            None if passed == 0 => ModuleOutcome::skipped("No tests were run"),
            None => ModuleOutcome::success(),
        };
        Ok(outcome.with_details(details))
    }
}
