//! Display-name deduplication across a task collection.
//!
//! Tasks sharing a base name are renamed `base`, `base (2)`, `base (3)`, …
//! Only names change; ids are preserved.

use crate::models::{Task, TaskId};
use std::collections::{BTreeMap, HashMap};

/// A name split into its base and trailing `" (N)"` index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseName<'a> {
    /// Name with every trailing suffix stripped.
    pub base: &'a str,
    /// Outermost suffix number, 1 when absent.
    pub index: u32,
}

/// Split one trailing `" (N)"` suffix off `name`.
fn strip_suffix(name: &str) -> Option<(&str, u32)> {
    let inner = name.strip_suffix(')')?;
    let open = inner.rfind(" (")?;
    let digits = &inner[open + 2..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let base = &inner[..open];
    if base.is_empty() {
        return None;
    }
    let index = digits.parse::<u32>().ok().filter(|n| *n > 0).unwrap_or(1);
    Some((base, index))
}

/// Parse a display name into base and index.
///
/// Suffixes are stripped repeatedly so that `"Walk (2) (3)"` belongs to
/// the `"Walk"` group; the index is taken from the outermost suffix.
pub fn parse_base_name(name: &str) -> BaseName<'_> {
    let Some((mut base, index)) = strip_suffix(name) else {
        return BaseName { base: name, index: 1 };
    };
    while let Some((inner, _)) = strip_suffix(base) {
        base = inner;
    }
    BaseName { base, index }
}

/// Result of a normalization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedTasks {
    /// Renamed tasks, grouped by base in order of first appearance.
    pub tasks: Vec<Task>,
    /// Final display name to the id now holding it.
    pub id_map: BTreeMap<String, TaskId>,
}

/// Recompute display names so tasks sharing a base never collide.
pub fn normalize_names(tasks: Vec<Task>) -> NormalizedTasks {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<(u32, Task)>> = HashMap::new();

    for task in tasks {
        let parsed = parse_base_name(&task.name);
        let base = parsed.base.to_string();
        let index = parsed.index;
        if !groups.contains_key(&base) {
            order.push(base.clone());
        }
        groups.entry(base).or_default().push((index, task));
    }

    let mut result = NormalizedTasks::default();
    for base in order {
        let Some(mut group) = groups.remove(&base) else {
            continue;
        };
        group.sort_by(|(ia, a), (ib, b)| ia.cmp(ib).then_with(|| a.name.cmp(&b.name)));

        for (position, (_, mut task)) in group.into_iter().enumerate() {
            task.name = if position == 0 {
                base.clone()
            } else {
                format!("{} ({})", base, position + 1)
            };
            result.id_map.insert(task.name.clone(), task.id.clone());
            result.tasks.push(task);
        }
    }
    result
}

/// Name a newly added task would receive before normalization.
pub fn next_display_name(tasks: &[Task], base: &str) -> String {
    let prefix = format!("{} (", base);
    let duplicates = tasks
        .iter()
        .filter(|task| task.name == base || task.name.starts_with(&prefix))
        .count();
    if duplicates == 0 {
        base.to_string()
    } else {
        format!("{} ({})", base, duplicates + 1)
    }
}
