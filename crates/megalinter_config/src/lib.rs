//! # megalinter_config
//!
//! Configuration resolution for MegaLinter runs.
//!
//! This crate provides:
//! - Loading of YAML configuration documents from disk or over HTTP
//! - `EXTENDS` inheritance across local and remote documents
//! - A request-scoped [`ConfigStore`] shared by every collaborator of a run
//! - Typed accessors and a redacted environment view for subprocesses
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use megalinter_config::{ConfigMapping, ConfigResolver, ConfigStore, RequestId};
//!
//! let store = Arc::new(ConfigStore::new());
//! let resolver = ConfigResolver::new(Arc::clone(&store));
//! let id = RequestId::from("lint-1");
//!
//! resolver.init(&id, Some(Path::new(".")), ConfigMapping::new())?;
//!
//! let args = store.get_list_args(&id, "PYTHON_PYLINT_ARGUMENTS")?.unwrap_or_default();
//! let env = store.materialize_environment(&id, true)?;
//! # Ok::<(), megalinter_config::ConfigError>(())
//! ```

mod accessor;
mod error;
pub mod extends;
pub mod http_client;
pub mod resolver;
pub mod secured;
pub mod source;
mod store;
mod value;

pub use error::ConfigError;
pub use extends::{EXTENDS_KEY, ExtendsResolution, ExtendsResolver};
pub use http_client::HttpClient;
pub use resolver::{CONFIG_FILE_CANDIDATES, CONFIG_FILE_KEY, ConfigResolver, discover_config};
pub use secured::{DEFAULT_SECURED_VARIABLES, REDACTION_MARKER};
pub use source::{ConfigLocation, LoadedDocument, SourceLoader};
pub use store::{ConfigStore, Environment, RunConfig};
pub use value::{ConfigMapping, ConfigValue, RequestId};
