//! # kopskit
//!
//! Typed access to the kops command line.
//!
//! wk drives kops for every cluster mutation. This crate describes those
//! invocations as [`KopsCommand`] values and runs them through a
//! [`Provisioner`], so orchestration code can be tested against a fake.
//!
//! ## Example
//!
//! ```no_run
//! use kopskit::{KopsBackend, Provisioner};
//!
//! let kops = KopsBackend::new()?;
//! let env = vec![("KOPS_STATE_STORE".to_string(), "s3://state".to_string())];
//! kops.update_cluster("prod.k8s.example.com", &env)?;
//! # Ok::<(), kopskit::Error>(())
//! ```

pub mod backend;
mod error;
mod types;

pub use backend::Provisioner;
pub use backend::kops::KopsBackend;
pub use error::{Error, Result};
pub use types::{Env, KopsCommand};
