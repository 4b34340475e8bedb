//! Location descriptors and their parser.
//!
//! A descriptor is a compact string of the form
//! `{key}(priority)path/name.extension` where every segment except `name` is
//! optional. Decoding order: key segment, priority segment, then the
//! remainder splits on the last `/` into path and filename, and the filename
//! splits on the last `.` into name and extension.

use serde::{Deserialize, Serialize};

use crate::error::{LocateError, MalformedReason};

const KEY_PREFIX: char = '{';
const KEY_SUFFIX: char = '}';
const PRIORITY_PREFIX: char = '(';
const PRIORITY_SUFFIX: char = ')';
const PATH_SEPARATOR: char = '/';
const NAME_SEPARATOR: char = '.';

/// Parsed, structured form of a location descriptor. Constructed once,
/// immutable thereafter, consumed by the convention expansion. Also
/// deserializable, so positions can come straight out of application
/// settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Identity of the configuration data. Defaults to `name` when absent.
    #[serde(default)]
    pub key: Option<String>,
    /// Explicit priority. `None` means "unordered / lowest".
    #[serde(default)]
    pub priority: Option<f64>,
    /// Directory holding the artifact. `None` means "search all convention
    /// directories".
    #[serde(default)]
    pub path: Option<String>,
    /// Base file name. Mandatory, never blank.
    pub name: String,
    /// Extension including the leading dot. `None` means "search all
    /// convention extensions".
    #[serde(default)]
    pub extension: Option<String>,
    /// Per-position auto-refresh override. `None` falls back to the global
    /// setting.
    #[serde(default)]
    pub refresh_enabled: Option<bool>,
}

impl Position {
    /// Structured entry with only a name; remaining fields unset.
    pub fn named(name: impl Into<String>) -> Self {
        Position {
            key: None,
            priority: None,
            path: None,
            name: name.into(),
            extension: None,
            refresh_enabled: None,
        }
    }

    /// Key under which this position's resources register.
    pub fn effective_key(&self) -> &str {
        self.key.as_deref().unwrap_or(&self.name)
    }

    /// Validate a structured entry: `name` is mandatory, `key` defaults to
    /// `name`. Positions built by [`Position::parse`] are already normalized.
    pub fn normalized(mut self) -> Result<Self, LocateError> {
        if self.name.trim().is_empty() {
            return Err(LocateError::Incomplete {
                location: format!("{:?}", self),
            });
        }
        if self.key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            self.key = Some(self.name.clone());
        }
        Ok(self)
    }

    /// Decode one descriptor string into a `Position`.
    ///
    /// Never partially valid: either the full position or an error.
    pub fn parse(descriptor: &str) -> Result<Self, LocateError> {
        let original = descriptor.trim();

        let segments = Segments::pickup(original)?;
        let mut location = segments.remainder.as_str();

        let mut path = None;
        if let Some(idx) = location.rfind(PATH_SEPARATOR) {
            if idx == 0 {
                path = Some(PATH_SEPARATOR.to_string());
            } else {
                path = Some(location[..idx].to_string());
            }
            location = &location[idx + 1..];
        }

        let (name, extension) = match location.rfind(NAME_SEPARATOR) {
            // A leading dot belongs to the name (dotfiles have no extension).
            Some(idx) if idx > 0 => (
                location[..idx].to_string(),
                Some(location[idx..].to_string()),
            ),
            _ => (location.to_string(), None),
        };

        if name.trim().is_empty() {
            return Err(LocateError::Incomplete {
                location: original.to_string(),
            });
        }

        Position {
            key: segments.key,
            priority: segments.priority,
            path,
            name,
            extension,
            refresh_enabled: None,
        }
        .normalized()
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(key) = &self.key {
            write!(f, "{{{}}}", key)?;
        }
        if let Some(priority) = self.priority {
            write!(f, "({})", priority)?;
        }
        if let Some(path) = &self.path {
            write!(f, "{}", path)?;
            if !path.ends_with(PATH_SEPARATOR) {
                write!(f, "{}", PATH_SEPARATOR)?;
            }
        }
        write!(f, "{}", self.name)?;
        if let Some(extension) = &self.extension {
            write!(f, "{}", extension)?;
        }
        Ok(())
    }
}

/// Key and priority segments stripped out of a descriptor.
struct Segments {
    key: Option<String>,
    priority: Option<f64>,
    remainder: String,
}

impl Segments {
    fn pickup(original: &str) -> Result<Self, LocateError> {
        let key_range = segment_range(original, KEY_PREFIX, KEY_SUFFIX)?;
        let priority_range = segment_range(original, PRIORITY_PREFIX, PRIORITY_SUFFIX)?;

        // When both segments occur, the key segment must sit entirely before
        // the priority segment; anything else interleaves.
        if let (Some(key), Some(priority)) = (&key_range, &priority_range) {
            if key.1 > priority.0 {
                return Err(LocateError::Malformed {
                    reason: MalformedReason::SymbolsOutOfOrder,
                    location: original.to_string(),
                });
            }
        }

        let key = key_range.as_ref().and_then(|&(start, end)| {
            let content = &original[start + KEY_PREFIX.len_utf8()..end];
            if content.trim().is_empty() {
                // Blank key means "not specified"; name takes over later.
                None
            } else {
                Some(content.to_string())
            }
        });

        let priority = match priority_range {
            Some((start, end)) => {
                let content = original[start + PRIORITY_PREFIX.len_utf8()..end].trim();
                if content.is_empty() {
                    None
                } else {
                    // `f64::from_str` accepts "nan"/"inf"; a priority must be
                    // a real number, so non-finite values are malformed too.
                    match content.parse::<f64>().ok().filter(|value| value.is_finite()) {
                        Some(value) => Some(value),
                        None => {
                            return Err(LocateError::Malformed {
                                reason: MalformedReason::PriorityNotANumber,
                                location: original.to_string(),
                            })
                        }
                    }
                }
            }
            None => None,
        };

        let remainder = strip_ranges(original, key_range, priority_range);
        if remainder.trim().is_empty() {
            return Err(LocateError::Incomplete {
                location: original.to_string(),
            });
        }

        Ok(Segments {
            key,
            priority,
            remainder: remainder.trim().to_string(),
        })
    }
}

/// Locate a `prefix…suffix` segment, validating delimiter well-formedness.
/// Returns the byte indices of the prefix and suffix characters.
fn segment_range(
    location: &str,
    prefix: char,
    suffix: char,
) -> Result<Option<(usize, usize)>, LocateError> {
    let malformed = |reason| LocateError::Malformed {
        reason,
        location: location.to_string(),
    };

    match (location.find(prefix), location.find(suffix)) {
        (None, None) => Ok(None),
        (Some(_), None) => Err(malformed(MalformedReason::UnmatchedSymbol(prefix))),
        (None, Some(_)) => Err(malformed(MalformedReason::UnmatchedSymbol(suffix))),
        (Some(prefix_idx), Some(suffix_idx)) => {
            if location.rfind(prefix) != Some(prefix_idx) {
                return Err(malformed(MalformedReason::DuplicateSymbol(prefix)));
            }
            if location.rfind(suffix) != Some(suffix_idx) {
                return Err(malformed(MalformedReason::DuplicateSymbol(suffix)));
            }
            if prefix_idx > suffix_idx {
                return Err(malformed(MalformedReason::ReversedSymbols(prefix, suffix)));
            }
            Ok(Some((prefix_idx, suffix_idx)))
        }
    }
}

/// Rebuild the descriptor with the given segment ranges removed. Ranges are
/// disjoint by the time this runs.
fn strip_ranges(
    original: &str,
    first: Option<(usize, usize)>,
    second: Option<(usize, usize)>,
) -> String {
    let mut ranges: Vec<(usize, usize)> = first.into_iter().chain(second).collect();
    ranges.sort_by_key(|r| r.0);

    let mut remainder = String::with_capacity(original.len());
    let mut cursor = 0;
    for (start, end) in ranges {
        remainder.push_str(&original[cursor..start]);
        cursor = end + 1;
    }
    remainder.push_str(&original[cursor..]);
    remainder
}
