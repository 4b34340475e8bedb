//! Error types for descriptor parsing, resource loading, and registry init.

use thiserror::Error;

/// Why a location descriptor is malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    /// A segment prefix or suffix symbol occurs more than once.
    DuplicateSymbol(char),
    /// A segment prefix occurs without its suffix, or the other way around.
    UnmatchedSymbol(char),
    /// A segment suffix occurs before its prefix.
    ReversedSymbols(char, char),
    /// Key and priority segment ranges interleave.
    SymbolsOutOfOrder,
    /// The priority segment content is not a number.
    PriorityNotANumber,
}

impl std::fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MalformedReason::DuplicateSymbol(symbol) => {
                write!(f, "duplicate symbol '{}'", symbol)
            }
            MalformedReason::UnmatchedSymbol(symbol) => {
                write!(f, "unmatched symbol '{}'", symbol)
            }
            MalformedReason::ReversedSymbols(prefix, suffix) => {
                write!(f, "'{}' and '{}' symbols are reversed", prefix, suffix)
            }
            MalformedReason::SymbolsOutOfOrder => write!(f, "symbols are out of order"),
            MalformedReason::PriorityNotANumber => write!(f, "priority must be a number"),
        }
    }
}

/// Descriptor-level errors, raised before any I/O happens.
#[derive(Debug, Error)]
pub enum LocateError {
    #[error("malformed location ({reason}): {location}")]
    Malformed {
        reason: MalformedReason,
        location: String,
    },

    #[error("incomplete location (a name is required): {location}")]
    Incomplete { location: String },
}

/// Raw text refused by one of the format parsers.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("config content root must be a table")]
    RootNotTable,

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Properties(#[from] ini::ParseError),
}

/// Failure while reading or parsing one located resource. Fatal to the
/// owning key's merge, invisible to every other key.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("error reading config resource {resource}: {source}")]
    Read {
        resource: String,
        #[source]
        source: std::io::Error,
    },

    #[error("error parsing config resource {resource}: {source}")]
    Parse {
        resource: String,
        #[source]
        source: ParseError,
    },
}

/// Registry-level errors for `init` / `refresh`.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Locate(#[from] LocateError),

    #[error("config load failed for {} key(s): {}", .failures.len(), failed_keys(.failures))]
    Load { failures: Vec<(String, LoadError)> },
}

fn failed_keys(failures: &[(String, LoadError)]) -> String {
    failures
        .iter()
        .map(|(key, _)| key.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_display_names_symbol_and_location() {
        let err = LocateError::Malformed {
            reason: MalformedReason::DuplicateSymbol('{'),
            location: "{{redis}db".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("duplicate symbol '{'"));
        assert!(text.contains("{{redis}db"));
    }

    #[test]
    fn test_registry_load_error_lists_keys() {
        let err = RegistryError::Load {
            failures: vec![
                (
                    "redis".to_string(),
                    LoadError::Read {
                        resource: "file [redis.conf]".to_string(),
                        source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
                    },
                ),
                (
                    "db".to_string(),
                    LoadError::Read {
                        resource: "file [db.conf]".to_string(),
                        source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
                    },
                ),
            ],
        };
        let text = err.to_string();
        assert!(text.contains("2 key(s)"));
        assert!(text.contains("redis, db"));
    }
}
