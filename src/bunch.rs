//! Resource bunches: everything found for one position.
//!
//! A bunch groups all physical resources resolved from a single position. An
//! under-specified position (no path, no extension) may match several
//! convention combinations, so one bunch can carry several resources; their
//! convention priorities decide the merge order inside the bunch. Several
//! bunches can share one key, and their explicit priorities decide the merge
//! order across bunches.

use std::collections::BTreeMap;

use crate::priority::Prioritized;
use crate::resource::ConfigResource;

/// Immutable grouping of the resources found for one position.
#[derive(Debug, Clone)]
pub struct Bunch {
    key: String,
    name: String,
    priority: Option<f64>,
    /// Keyed by resource description so identical candidates collapse.
    resources: BTreeMap<String, ConfigResource>,
    refresh_enabled: Option<bool>,
}

impl Bunch {
    pub fn new(
        key: String,
        name: String,
        priority: Option<f64>,
        resources: BTreeMap<String, ConfigResource>,
        refresh_enabled: Option<bool>,
    ) -> Self {
        Bunch {
            key,
            name,
            priority,
            resources,
            refresh_enabled,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn refresh_enabled(&self) -> Option<bool> {
        self.refresh_enabled
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn resources(&self) -> impl Iterator<Item = &ConfigResource> {
        self.resources.values()
    }

    /// Resources in merge order: ascending convention priority, stable.
    pub fn sorted_resources(&self) -> Vec<&ConfigResource> {
        let mut resources: Vec<&ConfigResource> = self.resources.values().collect();
        resources.sort_by(|a, b| a.priority().total_cmp(&b.priority()));
        resources
    }
}

impl Prioritized for Bunch {
    fn priority(&self) -> Option<f64> {
        self.priority
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{DefaultResourceLoader, ResourceLoader};
    use tempfile::TempDir;

    fn resource(dir: &TempDir, file: &str, content: &str, priority: f64) -> ConfigResource {
        let path = dir.path().join(file);
        std::fs::write(&path, content).unwrap();
        let loader = DefaultResourceLoader::new().with_root(dir.path());
        ConfigResource::new(loader.get_resource(file), ".conf".to_string(), priority).unwrap()
    }

    #[test]
    fn test_duplicate_descriptions_collapse() {
        let dir = TempDir::new().unwrap();
        let first = resource(&dir, "a.conf", "x = 1", 1.0);
        let second = resource(&dir, "a.conf", "x = 1", 3.0);

        let mut resources = BTreeMap::new();
        resources.insert(first.description(), first);
        resources.insert(second.description(), second);

        let bunch = Bunch::new("a".into(), "a".into(), None, resources, None);
        let sorted = bunch.sorted_resources();
        assert_eq!(sorted.len(), 1);
        // The later convention hit wins the slot.
        assert_eq!(sorted[0].priority(), 3.0);
    }

    #[test]
    fn test_sorted_resources_ascend_by_convention_priority() {
        let dir = TempDir::new().unwrap();
        let mut resources = BTreeMap::new();
        for (file, priority) in [("c.conf", 3.0), ("a.conf", 1.0), ("b.conf", 2.0)] {
            let r = resource(&dir, file, "x = 1", priority);
            resources.insert(r.description(), r);
        }

        let bunch = Bunch::new("k".into(), "k".into(), Some(1.0), resources, None);
        let priorities: Vec<f64> = bunch.sorted_resources().iter().map(|r| r.priority()).collect();
        assert_eq!(priorities, vec![1.0, 2.0, 3.0]);
    }
}
