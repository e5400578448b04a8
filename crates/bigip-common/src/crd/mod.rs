//! Custom Resource Definitions read by bigip-ctlr

mod tls_profile;

pub use tls_profile::{parse_profile_path, TLSProfile, TlsProfileSpec, TlsSpec, TlsTermination};
