pub mod config;
pub mod error;
pub mod provider;
pub mod types;

pub use config::Config;
pub use error::{BoxError, Error, Result};
pub use provider::{ConceptSource, ConceptTagLookup, IndustryTableSource};
pub use types::*;
