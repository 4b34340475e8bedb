//! Priority ordering shared by locators, bunches, and listeners.
//!
//! A total order over optional priorities: `None` sorts below any numeric
//! value, two `None`s compare equal, numbers compare numerically. Every sort
//! in this crate is stable, so equal-priority entries keep their declaration
//! order.

use std::cmp::Ordering;

/// Capability for anything ordered by an optional numeric priority.
pub trait Prioritized {
    /// Priority of this entity, `None` meaning "unordered / lowest".
    fn priority(&self) -> Option<f64>;
}

/// Compare two optional priorities with the null-low rule. `total_cmp`
/// keeps the comparator consistent even for non-finite values a caller
/// smuggles in through a structured position.
pub fn compare_priority(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.total_cmp(&b),
    }
}

/// Stable ascending sort of prioritized entities.
pub fn sort_by_priority<T: Prioritized>(items: &mut [T]) {
    items.sort_by(|a, b| compare_priority(a.priority(), b.priority()));
}
