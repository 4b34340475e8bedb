//! Resource locators.
//!
//! A locator turns its declared set of locations into a per-key collection
//! of bunches. Several locators can feed one registry (local files today,
//! other stores later); each carries an optional priority deciding whose
//! bunches merge later for a shared key.

pub mod local;

pub use local::LocalFileLocator;

use std::collections::HashMap;

use crate::bunch::Bunch;
use crate::error::LocateError;

/// Capability every locator implements.
pub trait ConfigLocator: Send + Sync {
    /// Resolve the declared locations into existing resources, grouped by
    /// key. Keys with no existing resources are absent from the result.
    fn locate(&self) -> Result<HashMap<String, Vec<Bunch>>, LocateError>;

    /// Execution priority among locators, null-low. When unset, registration
    /// order decides.
    fn priority(&self) -> Option<f64> {
        None
    }
}
