//! # gkepool-scopes
//!
//! OAuth scope handling for node pools.
//!
//! A node pool carries a raw, ordered list of OAuth scope URLs. Users edit a
//! compact selection instead: `default`, `full`, or `custom` plus a per-API
//! scope configuration. This crate owns both directions of that mapping and
//! the static option tables behind it.
//!
//! The mapping is lossy: several raw lists normalize to the same selection.
//! It is idempotent once normalized, i.e. `map(unmap(map(s))) == map(s)`.

mod catalog;
mod error;
mod selection;

pub use catalog::*;
pub use error::ScopeError;
pub use selection::*;
