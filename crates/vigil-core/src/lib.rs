pub mod audit;
pub mod config;
pub mod connectors;
pub mod dedup;
pub mod error;
pub mod io;
pub mod paths;
pub mod record;
pub mod registry;
pub mod sources;
pub mod vault;
pub mod watcher;

pub use error::{Result, VigilError};
