//! # template
//!
//! Cluster template model and expansion for wk.
//!
//! A cluster is described by a jsonnet template that renders to one JSON
//! document holding the cluster name and a `kops` section: environment,
//! create flags, the cluster fragment, instance-group fragments and channel
//! definitions. This crate provides:
//!
//! - [`Cluster`] and friends: the rendered document model
//! - [`Expander`]: the template engine seam
//! - [`JsonnetExpander`]: the `jsonnet` CLI implementation
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use template::{JsonnetExpander, expand_cluster};
//!
//! let expander = JsonnetExpander::new(Path::new("/path/to/workspace"))?;
//! let (cluster, rendered) = expand_cluster(&expander, Path::new("prod.jsonnet"))?;
//! println!("{} has {} instance groups", cluster.name, cluster.kops.instance_groups.len());
//! println!("rendered into {}", rendered.path().display());
//! # Ok::<(), template::Error>(())
//! ```

mod error;
mod expander;
mod jsonnet;
mod types;

pub use error::{Error, Result};
pub use expander::{Bindings, Expander, Rendered, expand_cluster};
pub use jsonnet::JsonnetExpander;
pub use types::{ChannelSpec, Cluster, InstanceGroupSpec, KopsSpec};
