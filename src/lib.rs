//! Request-driven create, update and validate behaviour for persistable
//! records.
//!
//! The `validation` package supplies error collection, declarative rules
//! and the rule-engine seam; the `binding` package supplies the storage
//! contract ([`Persistable`]) and the orchestration trait
//! ([`RequestModel`]) that merges request input into a record, applies
//! rules and inline field validators, and conditionally persists the
//! result around its lifecycle hooks.

pub use binding::*;
pub use validation::*;
