//! secretsmanager-loader - service configuration from versioned secrets
//!
//! This library loads the configuration of a service from a secret stored
//! under `secrets/{environment}/{service}` in a key-value secret store. It is
//! meant to be plugged into a larger configuration-assembly framework that
//! merges the returned mapping into an application's runtime configuration.
//!
//! # Features
//!
//! - **Naming convention**: underscores in service names become hyphens
//! - **Version selection**: read the current version or a named version stage
//! - **Offline runs**: `debug` and `testing` descriptors never touch the store
//! - **Strict decoding**: corrupted payloads fail loudly instead of yielding empty configuration
//! - **Pluggable transport**: the AWS SDK, local files, or any injected client
//!
//! # Example
//!
//! ```ignore
//! use secretsmanager_loader::{Metadata, SecretsManagerLoader};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let loader = SecretsManagerLoader::new(Some("prod".into()), None, None);
//!
//!     // Reads secrets/prod/billing-service
//!     let config = loader.load(&Metadata::new("billing_service"), None)?;
//!
//!     if let Some(postgres) = config.get("postgres") {
//!         println!("postgres host: {}", postgres["host"]);
//!     }
//!
//!     Ok(())
//! }
//! ```

// Internal modules
mod error;
mod loader;
mod metadata;

pub mod client;

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;

// Public API exports
pub use error::{LoaderError, Result};
pub use loader::{ConfigMap, SecretsManagerLoader, decode_config, storage_key};
pub use metadata::{Metadata, ServiceDescriptor};
pub use secretsmanager_loader_core::{LoaderSettings, ParseError};
