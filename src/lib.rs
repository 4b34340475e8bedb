//! Strata: Priority-Ordered Configuration Resolution
//!
//! Resolves compact location descriptors (`{key}(priority)path/name.extension`)
//! into fully merged, last-write-wins configuration trees per key. Intended to
//! bootstrap application configuration from an arbitrary number of local,
//! convention-based files before the rest of an application starts.

pub mod bunch;
pub mod echo;
pub mod error;
pub mod listener;
pub mod locator;
pub mod merge;
pub mod position;
pub mod priority;
pub mod registry;
pub mod resource;
pub mod tree;
