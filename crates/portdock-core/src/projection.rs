//! View projection: filter, group, and collapse state over a snapshot.
//!
//! Everything here is derived: recomputed from the current snapshot and
//! `ViewState` on each change, holding nothing the sync layer depends on.

use std::collections::HashSet;

use serde::Serialize;

use crate::types::{Category, ServerRecord};

// ─── ViewState ────────────────────────────────────────────────────

/// Presentation-owned state: the search filter and which category
/// sections are collapsed.
#[derive(Debug, Clone)]
pub struct ViewState {
    filter: String,
    collapsed: HashSet<Category>,
}

impl Default for ViewState {
    fn default() -> Self {
        // System processes are noise for most users; start them folded.
        Self {
            filter: String::new(),
            collapsed: HashSet::from([Category::System]),
        }
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn set_filter(&mut self, text: impl Into<String>) {
        self.filter = text.into();
    }

    /// Toggle a category's collapsed state. Idempotent set membership:
    /// toggling twice restores the original state.
    pub fn toggle(&mut self, category: Category) {
        if !self.collapsed.remove(&category) {
            self.collapsed.insert(category);
        }
    }

    pub fn is_collapsed(&self, category: Category) -> bool {
        self.collapsed.contains(&category)
    }
}

// ─── Projection ───────────────────────────────────────────────────

/// One category section of the projected view.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryGroup {
    pub category: Category,
    pub label: &'static str,
    pub collapsed: bool,
    pub records: Vec<ServerRecord>,
}

/// Case-insensitive match against project name, process name, or the
/// port rendered as decimal text. An empty filter matches everything.
pub fn matches_filter(record: &ServerRecord, filter: &str) -> bool {
    if filter.is_empty() {
        return true;
    }
    let needle = filter.to_lowercase();
    record.project_name.to_lowercase().contains(&needle)
        || record.process_name.to_lowercase().contains(&needle)
        || record.port.to_string().contains(&needle)
}

/// Project a snapshot into display groups: filter, then partition by
/// category in fixed order, omitting categories left empty. Record order
/// within a group is the backend's order (no re-sort here).
pub fn project(records: &[ServerRecord], view: &ViewState) -> Vec<CategoryGroup> {
    Category::ALL
        .into_iter()
        .filter_map(|category| {
            let matched: Vec<ServerRecord> = records
                .iter()
                .filter(|r| r.category == category && matches_filter(r, view.filter()))
                .cloned()
                .collect();
            if matched.is_empty() {
                return None;
            }
            Some(CategoryGroup {
                category,
                label: category.label(),
                collapsed: view.is_collapsed(category),
                records: matched,
            })
        })
        .collect()
}
