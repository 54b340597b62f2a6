//! # channel
//!
//! Builds kops addon channels from folders of jsonnet templates.
//!
//! Every template under a channel folder is expanded on its own worker,
//! optionally checked by a [`PolicyGate`], hashed, and listed in an `Addons`
//! manifest sorted by path. A single failing file fails the whole channel,
//! but only after every worker has finished.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use channel::{BuildOptions, Channel, NoProgress, build_channel};
//! use template::{ChannelSpec, JsonnetExpander};
//!
//! let workspace = Path::new("/path/to/workspace");
//! let expander = JsonnetExpander::new(workspace)?;
//! let spec = ChannelSpec {
//!     name: "addons".into(),
//!     folder: "addons".into(),
//!     ..Default::default()
//! };
//! if let Some(channel) = Channel::from_spec(&spec, workspace)? {
//!     let options = BuildOptions {
//!         cluster_file: Path::new("/tmp/cluster.json"),
//!         output_dir: Some(Path::new("out/addons")),
//!         jobs: None,
//!         policy: None,
//!     };
//!     let output = build_channel(&channel, &expander, options, &NoProgress)?;
//!     println!("{}", output.manifest);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod manifest;
mod pipeline;
mod policy;
mod progress;
mod types;

pub use error::{Error, Result};
pub use manifest::{ADDON_VERSION, MANIFEST_FILE, path_to_name, render_manifest};
pub use pipeline::{BuildOptions, ChannelOutput, build_channel, discover, relative_path};
pub use policy::{EMPTY_RESULT_ISSUE, OpaPolicy, PolicyFailure, PolicyGate, judge, split_documents};
pub use progress::{NoProgress, ProgressCallback};
pub use types::{Channel, ChannelItem, DEFAULT_FILTER, Verdict};
