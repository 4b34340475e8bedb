//! Local file locator: convention-based expansion of positions.
//!
//! When a position leaves path or extension unspecified, the locator probes
//! every convention directory × extension combination and keeps whatever
//! exists. Later combinations rank higher, so `file:./config/` overrides
//! `bundle:/`, and `.conf` overrides an unmarked file of the same name.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{debug, error};

use crate::bunch::Bunch;
use crate::error::LocateError;
use crate::locator::ConfigLocator;
use crate::position::Position;
use crate::resource::{ConfigResource, DefaultResourceLoader, ResourceLoader};

/// Convention directories, ascending priority: bundled defaults first, then
/// the working directory, most specific last.
pub const DEFAULT_PATHS: [&str; 4] = ["bundle:/", "bundle:/config/", "file:./", "file:./config/"];

/// Convention extensions, ascending priority. The empty entry matches an
/// unmarked file.
pub const DEFAULT_EXTENSIONS: [&str; 4] = ["", ".properties", ".json", ".conf"];

const PATH_SEPARATOR: char = '/';
const NAME_SEPARATOR: char = '.';

/// Locates configuration files on the local machine from descriptor strings
/// and structured positions.
pub struct LocalFileLocator {
    priority: Option<f64>,
    locations: Vec<String>,
    positions: Vec<Position>,
    loader: Arc<dyn ResourceLoader>,
}

impl LocalFileLocator {
    pub fn new() -> Self {
        LocalFileLocator {
            priority: None,
            locations: Vec::new(),
            positions: Vec::new(),
            loader: Arc::new(DefaultResourceLoader::new()),
        }
    }

    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Declare descriptor strings. Each entry may itself be a comma-separated
    /// list, the form user configuration persists.
    pub fn with_locations<I, S>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locations.extend(locations.into_iter().map(Into::into));
        self
    }

    /// Declare already-structured positions, bypassing descriptor parsing.
    pub fn with_positions(mut self, positions: impl IntoIterator<Item = Position>) -> Self {
        self.positions.extend(positions);
        self
    }

    /// Replace the resource loader, e.g. to root relative paths somewhere
    /// other than the current directory.
    pub fn with_loader(mut self, loader: Arc<dyn ResourceLoader>) -> Self {
        self.loader = loader;
        self
    }

    fn resolve_positions(&self) -> Result<Vec<Position>, LocateError> {
        let mut resolved = Vec::new();

        for location in &self.locations {
            for descriptor in location.split(',') {
                let descriptor = descriptor.trim();
                if descriptor.is_empty() {
                    continue;
                }
                resolved.push(Position::parse(descriptor)?);
            }
        }

        for position in &self.positions {
            resolved.push(position.clone().normalized()?);
        }

        Ok(resolved)
    }

    fn resolve_bunches(&self, positions: Vec<Position>) -> HashMap<String, Vec<Bunch>> {
        let mut bunches: HashMap<String, Vec<Bunch>> = HashMap::new();

        for position in positions {
            let paths: Vec<&str> = match position.path.as_deref() {
                Some(path) if !path.trim().is_empty() => vec![path],
                _ => DEFAULT_PATHS.to_vec(),
            };
            let extensions: Vec<&str> = match position.extension.as_deref() {
                Some(extension) if !extension.trim().is_empty() => vec![extension],
                _ => DEFAULT_EXTENSIONS.to_vec(),
            };

            let resources = self.expand(&position.name, &paths, &extensions);
            if resources.is_empty() {
                debug!(position = %position, "no config resource exists for position");
                continue;
            }

            let key = position.effective_key().to_string();
            let bunch = Bunch::new(
                key.clone(),
                position.name.clone(),
                position.priority,
                resources,
                position.refresh_enabled,
            );
            bunches.entry(key).or_default().push(bunch);
        }

        bunches
    }

    /// Probe every (directory, extension) combination in directory-major
    /// order; keep what exists, tagged with an increasing convention
    /// priority. Non-existent combinations are the expected, silent outcome
    /// of convention search.
    fn expand(
        &self,
        name: &str,
        paths: &[&str],
        extensions: &[&str],
    ) -> BTreeMap<String, ConfigResource> {
        let mut resources = BTreeMap::new();
        let mut priority = 0.0;

        for path in paths {
            for extension in extensions {
                let location = build_location(path, name, extension);
                let resource = self.loader.get_resource(&location);
                if !resource.exists() {
                    continue;
                }

                priority += 1.0;
                match ConfigResource::new(resource, extension.to_string(), priority) {
                    Ok(config_resource) => {
                        resources.insert(config_resource.description(), config_resource);
                    }
                    Err(err) => {
                        error!(location = %location, error = %err, "error locating config resource");
                    }
                }
            }
        }

        resources
    }
}

impl Default for LocalFileLocator {
    fn default() -> Self {
        LocalFileLocator::new()
    }
}

impl ConfigLocator for LocalFileLocator {
    fn locate(&self) -> Result<HashMap<String, Vec<Bunch>>, LocateError> {
        let positions = self.resolve_positions()?;
        Ok(self.resolve_bunches(positions))
    }

    fn priority(&self) -> Option<f64> {
        self.priority
    }
}

fn build_location(path: &str, name: &str, extension: &str) -> String {
    let mut location = String::from(path);
    if !location.ends_with(PATH_SEPARATOR) {
        location.push(PATH_SEPARATOR);
    }
    location.push_str(name);
    if !extension.is_empty() {
        if !extension.starts_with(NAME_SEPARATOR) {
            location.push(NAME_SEPARATOR);
        }
        location.push_str(extension);
    }
    location
}
