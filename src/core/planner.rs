//! # Module Selection Planner Module / 模块选择计划模块
//!
//! This module decides which registered modules a run covers, applying the
//! inclusion lists (id, tag, category) first and the exclusion lists (id, tag)
//! afterwards.
//!
//! 此模块决定一次运行覆盖哪些已注册模块：先应用包含列表（id、标签、类别），
//! 再应用排除列表（id、标签）。

use crate::core::models::TestFilter;
use crate::core::module::ModuleInfo;

/// The outcome of applying a filter to the registry.
/// 将过滤器应用于注册表的结果。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionPlan {
    /// Ids of the selected modules, in registry order.
    /// 被选中模块的 id，按注册表顺序。
    pub module_ids: Vec<String>,
    /// Modules dropped because they did not match an inclusion list.
    /// 因不匹配包含列表而被丢弃的模块数量。
    pub not_included_count: usize,
    /// Modules dropped by an exclusion list.
    /// 被排除列表丢弃的模块数量。
    pub excluded_count: usize,
}

/// True when `info` passes every inclusion list of `filter`.
/// An empty list places no constraint.
///
/// 当 `info` 通过 `filter` 的所有包含列表时为真。空列表不施加约束。
pub fn is_included(info: &ModuleInfo, filter: &TestFilter) -> bool {
    let id_ok = filter.module_ids.is_empty() || filter.module_ids.iter().any(|id| *id == info.id);
    let tag_ok = filter.tags.is_empty() || filter.tags.iter().any(|t| info.has_tag(t));
    let category_ok = filter.categories.is_empty()
        || filter
            .categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case(&info.category));
    id_ok && tag_ok && category_ok
}

/// True when `info` is hit by an exclusion list of `filter`.
/// 当 `info` 命中 `filter` 的排除列表时为真。
pub fn is_excluded(info: &ModuleInfo, filter: &TestFilter) -> bool {
    filter.exclude_module_ids.iter().any(|id| *id == info.id)
        || filter.exclude_tags.iter().any(|t| info.has_tag(t))
}

/// Selects the modules a run covers. Without a filter every module is selected.
///
/// # Arguments
/// * `modules` - The registered modules, in the order they should run
/// * `filter` - Optional inclusion and exclusion lists
///
/// 选择一次运行覆盖的模块。没有过滤器时选中所有模块。
pub fn plan_selection<'a, I>(modules: I, filter: Option<&TestFilter>) -> SelectionPlan
where
    I: IntoIterator<Item = &'a ModuleInfo>,
{
    let mut plan = SelectionPlan::default();
    for info in modules {
        match filter {
            Some(f) if !is_included(info, f) => plan.not_included_count += 1,
            Some(f) if is_excluded(info, f) => plan.excluded_count += 1,
            _ => plan.module_ids.push(info.id.clone()),
        }
    }
    tracing::debug!(
        selected = plan.module_ids.len(),
        not_included = plan.not_included_count,
        excluded = plan.excluded_count,
        "module selection planned"
    );
    plan
}
