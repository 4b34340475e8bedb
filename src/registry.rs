//! Configuration registry: the only long-lived state.
//!
//! `init` runs locators, merges every key, and commits the resulting trees.
//! Commits are per-key atomic: readers on other threads observe either the
//! previous tree for a key or the new one, never a partial merge. A failing
//! key is recorded and skipped; every other key still commits.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error};

use config::Value;

use crate::echo::Echo;
use crate::error::{LocateError, RegistryError};
use crate::listener::{self, ConfigListener};
use crate::locator::ConfigLocator;
use crate::merge::{merge_key, MergeOptions};
use crate::priority::compare_priority;
use crate::tree::ConfigTree;

/// One key's fully merged configuration.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    key: String,
    tree: ConfigTree,
}

impl ResolvedConfig {
    pub fn new(key: String, tree: ConfigTree) -> Self {
        ResolvedConfig { key, tree }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.tree.get(name)
    }

    pub fn get_string(&self, name: &str) -> Option<String> {
        self.get(name).cloned()?.into_string().ok()
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).cloned()?.into_int().ok()
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.get(name).cloned()?.into_float().ok()
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).cloned()?.into_bool().ok()
    }
}

/// Holds the per-key configuration trees after merge.
pub struct ConfigRegistry {
    enabled: bool,
    echo: Echo,
    refresh_enabled: bool,
    options: MergeOptions,
    locators: Vec<Box<dyn ConfigLocator>>,
    listeners: Vec<Arc<dyn ConfigListener>>,
    holder: RwLock<HashMap<String, Arc<ResolvedConfig>>>,
}

impl ConfigRegistry {
    pub fn new() -> Self {
        ConfigRegistry {
            enabled: true,
            echo: Echo::none(),
            refresh_enabled: false,
            options: MergeOptions::default(),
            locators: Vec::new(),
            listeners: Vec::new(),
            holder: RwLock::new(HashMap::new()),
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_echo(&mut self, echo: Echo) {
        self.echo = echo;
    }

    /// Global auto-refresh switch; individual positions may override it.
    /// Carried for collaborators, not acted on by this crate.
    pub fn set_refresh_enabled(&mut self, refresh_enabled: bool) {
        self.refresh_enabled = refresh_enabled;
    }

    pub fn refresh_enabled(&self) -> bool {
        self.refresh_enabled
    }

    pub fn set_fold_separator_case(&mut self, fold: bool) {
        self.options.fold_separator_case = fold;
    }

    pub fn add_locator(&mut self, locator: Box<dyn ConfigLocator>) {
        self.locators.push(locator);
    }

    pub fn add_listener(&mut self, listener: Arc<dyn ConfigListener>) {
        self.listeners.push(listener);
    }

    /// Configuration for one key, if its merge has committed.
    pub fn get(&self, key: &str) -> Option<Arc<ResolvedConfig>> {
        self.holder.read().get(key).cloned()
    }

    /// Snapshot of every committed key.
    pub fn get_all(&self) -> HashMap<String, Arc<ResolvedConfig>> {
        self.holder.read().clone()
    }

    /// Run the locate → merge → commit pipeline.
    pub fn init(&self) -> Result<(), RegistryError> {
        if !self.enabled {
            debug!("config registry is not enabled");
            return Ok(());
        }
        if self.locators.is_empty() {
            debug!("no config locator registered");
        }
        self.reload()
    }

    /// Re-run the same pipeline under the same merge contract. A key that
    /// fails keeps its previously committed tree.
    pub fn refresh(&self) -> Result<(), RegistryError> {
        if !self.enabled {
            return Ok(());
        }
        self.reload()
    }

    /// Clear all committed state.
    pub fn destroy(&self) {
        self.holder.write().clear();
    }

    fn reload(&self) -> Result<(), RegistryError> {
        let bunches_map = self.load_bunches()?;
        if bunches_map.is_empty() {
            debug!("no config resource located");
            return Ok(());
        }

        let listeners = listener::in_order(&self.listeners);

        let mut failures = Vec::new();
        for (key, bunches) in bunches_map {
            match merge_key(&key, bunches, self.options, self.echo, &listeners) {
                Ok(tree) => {
                    let resolved = Arc::new(ResolvedConfig::new(key.clone(), tree));
                    self.holder.write().insert(key, resolved);
                }
                Err(err) => {
                    error!(key = %key, error = %err, "config merge failed; key keeps its previous value");
                    failures.push((key, err));
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(RegistryError::Load { failures })
        }
    }

    /// Gather bunches from every locator, ascending locator priority, so a
    /// later locator's bunches merge after an earlier one's for a shared key.
    fn load_bunches(
        &self,
    ) -> Result<HashMap<String, Vec<crate::bunch::Bunch>>, LocateError> {
        let mut ordered: Vec<&dyn ConfigLocator> =
            self.locators.iter().map(|locator| locator.as_ref()).collect();
        ordered.sort_by(|a, b| compare_priority(a.priority(), b.priority()));

        let mut bunches_map: HashMap<String, Vec<crate::bunch::Bunch>> = HashMap::new();
        for locator in ordered {
            for (key, mut bunches) in locator.locate()? {
                bunches_map.entry(key).or_default().append(&mut bunches);
            }
        }
        Ok(bunches_map)
    }
}

impl Default for ConfigRegistry {
    fn default() -> Self {
        ConfigRegistry::new()
    }
}
