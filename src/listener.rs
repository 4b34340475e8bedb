//! Merge listeners.
//!
//! Listeners observe and may rewrite resource content as it flows through
//! the merge: `on_read` sees the raw text of every resource, `on_parsed` the
//! tree it parsed into. Listeners run in ascending `order`; ties keep
//! registration order.

use std::sync::Arc;

use crate::tree::ConfigTree;

/// Hook into the per-resource read/parse pipeline. `order` is mandatory and
/// decides invocation order, ascending.
pub trait ConfigListener: Send + Sync {
    fn order(&self) -> i32;

    /// Rewrite the raw text of a resource before parsing. The default keeps
    /// it unchanged.
    fn on_read(&self, _key: &str, _resource: &str, content: String) -> String {
        content
    }

    /// Rewrite the parsed tree of a resource before it folds into the
    /// accumulator. The default keeps it unchanged.
    fn on_parsed(&self, _key: &str, _resource: &str, tree: ConfigTree) -> ConfigTree {
        tree
    }
}

/// Listeners in invocation order: ascending `order`, stable.
pub fn in_order(listeners: &[Arc<dyn ConfigListener>]) -> Vec<Arc<dyn ConfigListener>> {
    let mut ordered = listeners.to_vec();
    ordered.sort_by_key(|listener| listener.order());
    ordered
}
