//! Resource abstraction: location strings to byte streams.
//!
//! A location string such as `file:./config/redis.conf` or
//! `bundle:/config/app.json` resolves to a [`Resource`] through a
//! [`ResourceLoader`]. The default loader handles two schemes: `file:` for
//! filesystem paths (relative paths resolve against a configurable root) and
//! `bundle:` for in-memory defaults registered by the embedding application.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

/// One addressable configuration artifact.
pub trait Resource: Send + Sync {
    /// Whether the artifact physically exists right now.
    fn exists(&self) -> bool;

    /// Read the full content.
    fn open(&self) -> io::Result<Vec<u8>>;

    /// Human-readable description, also used to deduplicate identical
    /// candidates across repeated convention hits.
    fn description(&self) -> String;
}

/// Resolves location strings into resources.
pub trait ResourceLoader: Send + Sync {
    fn get_resource(&self, location: &str) -> Arc<dyn Resource>;
}

/// Filesystem-backed resource.
pub struct FileResource {
    path: PathBuf,
}

impl FileResource {
    pub fn new(path: PathBuf) -> Self {
        FileResource { path }
    }
}

impl Resource for FileResource {
    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn open(&self) -> io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }

    fn description(&self) -> String {
        format!("file [{}]", self.path.display())
    }
}

/// In-memory defaults bundled with the application, the stand-in for
/// resources shipped inside the binary (for example via `include_str!`).
#[derive(Default, Clone)]
pub struct Bundle {
    entries: HashMap<String, String>,
}

impl Bundle {
    pub fn new() -> Self {
        Bundle::default()
    }

    /// Register an entry under an absolute bundle path such as
    /// `/config/app.conf`.
    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.entries.insert(path.into(), content.into());
    }

    fn get(&self, path: &str) -> Option<&String> {
        self.entries.get(path)
    }
}

struct BundleResource {
    path: String,
    content: Option<String>,
}

impl Resource for BundleResource {
    fn exists(&self) -> bool {
        self.content.is_some()
    }

    fn open(&self) -> io::Result<Vec<u8>> {
        match &self.content {
            Some(content) => Ok(content.clone().into_bytes()),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("bundle entry not found: {}", self.path),
            )),
        }
    }

    fn description(&self) -> String {
        format!("bundle [{}]", self.path)
    }
}

/// Default loader: `bundle:` locations resolve against a [`Bundle`],
/// everything else against the filesystem.
pub struct DefaultResourceLoader {
    root: PathBuf,
    bundle: Bundle,
}

impl DefaultResourceLoader {
    pub fn new() -> Self {
        DefaultResourceLoader {
            root: PathBuf::from("."),
            bundle: Bundle::new(),
        }
    }

    /// Base directory for relative `file:` locations. Defaults to the
    /// current directory.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_bundle(mut self, bundle: Bundle) -> Self {
        self.bundle = bundle;
        self
    }
}

impl Default for DefaultResourceLoader {
    fn default() -> Self {
        DefaultResourceLoader::new()
    }
}

const BUNDLE_SCHEME: &str = "bundle:";
const FILE_SCHEME: &str = "file:";

impl ResourceLoader for DefaultResourceLoader {
    fn get_resource(&self, location: &str) -> Arc<dyn Resource> {
        if let Some(path) = location.strip_prefix(BUNDLE_SCHEME) {
            return Arc::new(BundleResource {
                path: path.to_string(),
                content: self.bundle.get(path).cloned(),
            });
        }

        let path = location.strip_prefix(FILE_SCHEME).unwrap_or(location);
        let path = PathBuf::from(path);
        let path = if path.is_absolute() {
            path
        } else {
            self.root.join(path)
        };
        Arc::new(FileResource::new(path))
    }
}

/// One physical, existing artifact found by convention expansion: the
/// resource handle, a content hash for future change detection, the
/// extension the expansion matched with, and the convention priority
/// (later-enumerated combinations rank higher).
#[derive(Clone)]
pub struct ConfigResource {
    resource: Arc<dyn Resource>,
    hash: String,
    extension: String,
    priority: f64,
}

impl ConfigResource {
    /// Wrap an existing resource, hashing its current content.
    pub fn new(resource: Arc<dyn Resource>, extension: String, priority: f64) -> io::Result<Self> {
        let content = resource.open()?;
        let hash = blake3::hash(&content).to_hex().to_string();
        Ok(ConfigResource {
            resource,
            hash,
            extension,
            priority,
        })
    }

    pub fn open(&self) -> io::Result<Vec<u8>> {
        self.resource.open()
    }

    pub fn description(&self) -> String {
        self.resource.description()
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Extension the convention expansion matched, empty for unmarked files.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn priority(&self) -> f64 {
        self.priority
    }
}

impl std::fmt::Debug for ConfigResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigResource")
            .field("description", &self.description())
            .field("hash", &self.hash)
            .field("priority", &self.priority)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_resource_exists_and_reads() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.toml");
        std::fs::write(&path, "port = 8080\n").unwrap();

        let loader = DefaultResourceLoader::new().with_root(temp_dir.path());
        let resource = loader.get_resource("file:./app.toml");
        assert!(resource.exists());
        assert_eq!(resource.open().unwrap(), b"port = 8080\n");

        let missing = loader.get_resource("file:./missing.toml");
        assert!(!missing.exists());
    }

    #[test]
    fn test_bundle_resource_lookup() {
        let mut bundle = Bundle::new();
        bundle.insert("/config/app.conf", "name = \"app\"");
        let loader = DefaultResourceLoader::new().with_bundle(bundle);

        let resource = loader.get_resource("bundle:/config/app.conf");
        assert!(resource.exists());
        assert_eq!(resource.open().unwrap(), b"name = \"app\"");
        assert_eq!(resource.description(), "bundle [/config/app.conf]");

        assert!(!loader.get_resource("bundle:/other.conf").exists());
    }

    #[test]
    fn test_config_resource_hashes_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.conf");
        std::fs::write(&path, "x = 1").unwrap();

        let loader = DefaultResourceLoader::new().with_root(temp_dir.path());
        let resource = loader.get_resource("a.conf");
        let config_resource = ConfigResource::new(resource, ".conf".to_string(), 1.0).unwrap();

        assert_eq!(config_resource.hash(), blake3::hash(b"x = 1").to_hex().to_string());
        assert_eq!(config_resource.priority(), 1.0);
    }
}
