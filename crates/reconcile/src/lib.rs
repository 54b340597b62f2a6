//! # reconcile
//!
//! Merges templated desired state into objects held by kops.
//!
//! kops exposes mutation only through `kops edit`, which opens the object in
//! `$EDITOR`. wk installs itself as that editor (see [`hook`]) and, instead of
//! a human edit, performs a structural [`merge`] of the rendered fragment into
//! the live file. Each invocation records its outcome in a shared
//! [`AggregateState`] file that the orchestrator reads back to decide whether
//! `kops update cluster` must run.
//!
//! ## Example
//!
//! ```
//! use reconcile::merge;
//! use serde_json::json;
//!
//! let outcome = merge(&json!({"spec": {"size": 1}}), &json!({"spec": {"size": 3}}))?;
//! assert!(outcome.changed);
//! assert_eq!(outcome.merged, json!({"spec": {"size": 3}}));
//! # Ok::<(), reconcile::Error>(())
//! ```

pub mod diff;
mod error;
pub mod hook;
mod live;
mod merge;
mod state;

pub use error::{Error, Result};
pub use hook::{EditRequest, EditorHook, Mode};
pub use live::LiveObject;
pub use merge::{MergeOutcome, deep_merge, merge, preserve_creation_timestamp};
pub use state::{AggregateState, NO_CHANGES, ObjectState, ResourceId};
