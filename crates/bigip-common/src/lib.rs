//! Common types for bigip-ctlr: resource records, CRDs, configuration and errors

#![deny(missing_docs)]

pub mod config;
pub mod crd;
pub mod error;
pub mod resource;
pub mod telemetry;
pub mod yaml;

pub use config::{ControllerMode, SynthesisConfig};
pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Device-global partition; profiles here are shared by every tenant
pub const COMMON_PARTITION: &str = "Common";

/// Name of the shared AS3 application inside each tenant
pub const SHARED_APPLICATION: &str = "Shared";
