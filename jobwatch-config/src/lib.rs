//! Configuration for jobwatch.
//!
//! Settings are composed from a TOML file, a `.env` file and the process
//! environment, with the environment taking precedence. [`bootstrap`] turns
//! a loaded [`Config`] into a running [`jobwatch_core::LiveListSession`]
//! backed by Postgres.

#![allow(missing_docs)]

pub mod bootstrap;
pub mod constants;
pub mod loader;
pub mod models;
pub mod util;
pub mod validation;

pub use bootstrap::{connect_pool, connect_session};
pub use loader::{
    ConfigLoad, ConfigLoader, ConfigLoaderOptions, error::ConfigLoadError,
};
pub use models::{Config, ConfigMetadata, DatabaseConfig, FeedConfig};
pub use validation::{ConfigWarning, ConfigWarnings};
