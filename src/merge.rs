//! The merge engine: fold prioritized resource trees into one tree per key.
//!
//! For one key the input is every bunch gathered from every locator, already
//! in locator order. Bunches re-sort ascending by explicit priority (stable),
//! resources inside a bunch ascending by convention priority (stable), and
//! the parsed trees fold left-to-right in that order. Later trees win:
//! whenever an incoming property matches an existing one, the existing entry
//! is dropped and the incoming name and value take over. The whole merge for
//! a key either succeeds or commits nothing.

use std::sync::Arc;

use config::Value;

use crate::bunch::Bunch;
use crate::echo::{Echo, EchoReport};
use crate::error::LoadError;
use crate::listener::ConfigListener;
use crate::priority::sort_by_priority;
use crate::tree::ConfigTree;

/// Merge behavior switches.
#[derive(Debug, Clone, Copy)]
pub struct MergeOptions {
    /// Treat hyphenated and camel-cased property names as the same logical
    /// property: names are equivalent when they match after removing hyphens
    /// and lower-casing. The newer spelling and value always win.
    pub fold_separator_case: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        MergeOptions {
            fold_separator_case: true,
        }
    }
}

/// One step of the fold, as observed by echo/tracing.
#[derive(Debug, Clone, PartialEq)]
pub enum FoldEvent {
    New {
        name: String,
        value: Value,
    },
    Replaced {
        name: String,
        value: Value,
        old_name: String,
        old_value: Value,
    },
}

/// Merge all bunches of one key into its final tree.
pub fn merge_key(
    key: &str,
    mut bunches: Vec<Bunch>,
    options: MergeOptions,
    echo: Echo,
    listeners: &[Arc<dyn ConfigListener>],
) -> Result<ConfigTree, LoadError> {
    sort_by_priority(&mut bunches);

    let mut report = EchoReport::new(echo, key);
    report.summary_load(key);

    let mut accumulator: Option<ConfigTree> = None;
    for bunch in &bunches {
        for resource in bunch.sorted_resources() {
            let description = resource.description();
            report.summary_resource(bunch.key(), &description);

            let text = read_text(resource)?;
            let text = listeners.iter().fold(text, |text, listener| {
                listener.on_read(key, &description, text)
            });

            let tree = ConfigTree::parse(&text, resource.extension()).map_err(|source| {
                LoadError::Parse {
                    resource: description.clone(),
                    source,
                }
            })?;
            let tree = listeners.iter().fold(tree, |tree, listener| {
                listener.on_parsed(key, &description, tree)
            });

            accumulator = Some(match accumulator {
                // First resource for the key: its tree is the accumulator.
                None => {
                    for (name, value) in tree.entries() {
                        report.track_new(bunch.key(), name, value);
                    }
                    tree
                }
                Some(current) => {
                    let (folded, events) =
                        fold_tree(&current, &tree, options.fold_separator_case);
                    for event in &events {
                        match event {
                            FoldEvent::New { name, value } => {
                                report.track_new(bunch.key(), name, value)
                            }
                            FoldEvent::Replaced {
                                name,
                                value,
                                old_name,
                                old_value,
                            } => report.track_renew(bunch.key(), name, value, old_name, old_value),
                        }
                    }
                    folded
                }
            });
        }
    }

    let merged = accumulator.unwrap_or_default();
    report.content(key, &merged);
    report.emit();
    Ok(merged)
}

/// Fold one incoming tree into the accumulator. Pure: returns the new tree
/// plus the per-property events, mutates nothing.
pub fn fold_tree(
    accumulator: &ConfigTree,
    incoming: &ConfigTree,
    fold_separator_case: bool,
) -> (ConfigTree, Vec<FoldEvent>) {
    let mut result = accumulator.clone();
    let mut events = Vec::with_capacity(incoming.len());

    for (name, value) in incoming.entries() {
        let existing = if fold_separator_case {
            let folded = fold_name(name);
            result
                .entries()
                .iter()
                .find(|(existing_name, _)| fold_name(existing_name) == folded)
                .map(|(existing_name, existing_value)| {
                    (existing_name.clone(), existing_value.clone())
                })
        } else {
            result
                .get(name)
                .map(|existing_value| (name.clone(), existing_value.clone()))
        };

        match existing {
            Some((old_name, old_value)) => {
                // Drop the old entry and insert under the incoming spelling,
                // so at most one property per equivalence class survives.
                result = result.without_path(&old_name).with_value(name, value.clone());
                events.push(FoldEvent::Replaced {
                    name: name.clone(),
                    value: value.clone(),
                    old_name,
                    old_value,
                });
            }
            None => {
                result = result.with_value(name, value.clone());
                events.push(FoldEvent::New {
                    name: name.clone(),
                    value: value.clone(),
                });
            }
        }
    }

    (result, events)
}

/// Equivalence form of a property name: hyphens removed, lower-cased.
fn fold_name(name: &str) -> String {
    name.replace('-', "").to_lowercase()
}

fn read_text(resource: &crate::resource::ConfigResource) -> Result<String, LoadError> {
    let read_error = |source| LoadError::Read {
        resource: resource.description(),
        source,
    };
    let bytes = resource.open().map_err(read_error)?;
    String::from_utf8(bytes).map_err(|err| {
        read_error(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Bundle, ConfigResource, DefaultResourceLoader, ResourceLoader};
    use std::collections::BTreeMap;

    fn tree(text: &str) -> ConfigTree {
        ConfigTree::parse(text, ".conf").unwrap()
    }

    fn bundle_bunch(
        key: &str,
        priority: Option<f64>,
        files: &[(&str, &str, f64)],
    ) -> Bunch {
        let mut bundle = Bundle::new();
        for (path, content, _) in files {
            bundle.insert(*path, *content);
        }
        let loader = DefaultResourceLoader::new().with_bundle(bundle);

        let mut resources = BTreeMap::new();
        for (path, _, convention_priority) in files {
            let resource = loader.get_resource(&format!("bundle:{}", path));
            let extension = path.rsplit_once('.').map(|(_, ext)| format!(".{}", ext));
            let config_resource = ConfigResource::new(
                resource,
                extension.unwrap_or_default(),
                *convention_priority,
            )
            .unwrap();
            resources.insert(config_resource.description(), config_resource);
        }
        Bunch::new(key.into(), key.into(), priority, resources, None)
    }

    #[test]
    fn test_name_folding_replaces_spelling_and_value() {
        let accumulator = tree("remote-url = 1\n");
        let incoming = tree("remoteUrl = 2\n");

        let (merged, events) = fold_tree(&accumulator, &incoming, true);
        assert_eq!(merged.len(), 1);
        assert!(!merged.has_path("remote-url"));
        assert_eq!(merged.get("remoteUrl").cloned().unwrap().into_int().unwrap(), 2);
        assert!(matches!(
            &events[0],
            FoldEvent::Replaced { name, old_name, .. }
                if name == "remoteUrl" && old_name == "remote-url"
        ));
    }

    #[test]
    fn test_folding_disabled_keeps_both_spellings() {
        let accumulator = tree("remote-url = 1\n");
        let incoming = tree("remoteUrl = 2\n");

        let (merged, events) = fold_tree(&accumulator, &incoming, false);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get("remote-url").cloned().unwrap().into_int().unwrap(), 1);
        assert_eq!(merged.get("remoteUrl").cloned().unwrap().into_int().unwrap(), 2);
        assert!(matches!(&events[0], FoldEvent::New { .. }));
    }

    #[test]
    fn test_upper_case_spelling_folds_too() {
        let (merged, _) = fold_tree(&tree("remoteUrl = 1\n"), &tree("REMOTEURL = 3\n"), true);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged.get("REMOTEURL").cloned().unwrap().into_int().unwrap(), 3);
    }

    #[test]
    fn test_same_name_replacement_reports_old_value() {
        let (merged, events) = fold_tree(&tree("port = 1\n"), &tree("port = 2\n"), false);
        assert_eq!(merged.get("port").cloned().unwrap().into_int().unwrap(), 2);
        assert!(matches!(
            &events[0],
            FoldEvent::Replaced { old_name, .. } if old_name == "port"
        ));
    }

    #[test]
    fn test_merge_orders_bunches_by_explicit_priority() {
        let low = bundle_bunch("app", Some(1.0), &[("/low.conf", "port = 1\n", 1.0)]);
        let high = bundle_bunch("app", Some(2.0), &[("/high.conf", "port = 2\n", 1.0)]);

        // Feed out of order; explicit priorities decide.
        let merged = merge_key(
            "app",
            vec![high, low],
            MergeOptions::default(),
            Echo::none(),
            &[],
        )
        .unwrap();
        assert_eq!(merged.get("port").cloned().unwrap().into_int().unwrap(), 2);
    }

    #[test]
    fn test_priorityless_bunch_merges_first() {
        let unordered = bundle_bunch("app", None, &[("/none.conf", "port = 9\n", 1.0)]);
        let numbered = bundle_bunch("app", Some(-5.0), &[("/neg.conf", "port = 1\n", 1.0)]);

        let merged = merge_key(
            "app",
            vec![numbered, unordered],
            MergeOptions::default(),
            Echo::none(),
            &[],
        )
        .unwrap();
        // None sorts below any number, so the numbered bunch wins.
        assert_eq!(merged.get("port").cloned().unwrap().into_int().unwrap(), 1);
    }

    #[test]
    fn test_convention_priority_orders_inside_a_bunch() {
        let bunch = bundle_bunch(
            "app",
            None,
            &[
                ("/a.conf", "host = \"first\"\n", 1.0),
                ("/b.conf", "host = \"second\"\n", 2.0),
            ],
        );

        let merged =
            merge_key("app", vec![bunch], MergeOptions::default(), Echo::none(), &[]).unwrap();
        assert_eq!(
            merged.get("host").cloned().unwrap().into_string().unwrap(),
            "second"
        );
    }

    #[test]
    fn test_merge_is_idempotent() {
        let bunch = bundle_bunch("app", Some(1.0), &[("/a.conf", "port = 1\nhost = \"h\"\n", 1.0)]);

        let once = merge_key(
            "app",
            vec![bunch.clone()],
            MergeOptions::default(),
            Echo::none(),
            &[],
        )
        .unwrap();
        let twice = merge_key(
            "app",
            vec![bunch.clone(), bunch],
            MergeOptions::default(),
            Echo::none(),
            &[],
        )
        .unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_parse_failure_aborts_the_key() {
        let bunch = bundle_bunch(
            "app",
            None,
            &[
                ("/good.conf", "port = 1\n", 1.0),
                ("/bad.json", "{broken", 2.0),
            ],
        );

        let err = merge_key("app", vec![bunch], MergeOptions::default(), Echo::none(), &[])
            .unwrap_err();
        assert!(matches!(err, LoadError::Parse { ref resource, .. } if resource.contains("bad.json")));
    }

    #[test]
    fn test_listener_rewrites_content_in_order() {
        struct Doubler;
        impl ConfigListener for Doubler {
            fn order(&self) -> i32 {
                0
            }
            fn on_read(&self, _key: &str, _resource: &str, content: String) -> String {
                content.replace("port = 1", "port = 2")
            }
        }

        let bunch = bundle_bunch("app", None, &[("/a.conf", "port = 1\n", 1.0)]);
        let listeners: Vec<Arc<dyn ConfigListener>> = vec![Arc::new(Doubler)];
        let merged = merge_key(
            "app",
            vec![bunch],
            MergeOptions::default(),
            Echo::none(),
            &listeners,
        )
        .unwrap();
        assert_eq!(merged.get("port").cloned().unwrap().into_int().unwrap(), 2);
    }

    #[test]
    fn test_empty_input_yields_empty_tree() {
        let merged =
            merge_key("app", vec![], MergeOptions::default(), Echo::none(), &[]).unwrap();
        assert!(merged.is_empty());
    }
}
