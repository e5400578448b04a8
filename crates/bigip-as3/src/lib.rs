//! AS3 declaration synthesis for bigip-ctlr
//!
//! Turns a [`ResourceSnapshot`](bigip_common::resource::ResourceSnapshot) into
//! the AS3 request body the device consumes.
//!
//! - [`declaration`] - typed AS3 tree (ADC, Tenant, Application, Services, ...)
//! - [`pipeline`] - ordered synthesis stages writing into one shared application
//! - [`assembly`] - controls header, override handling and rendering

#![deny(missing_docs)]

pub mod assembly;
pub mod declaration;
pub mod pipeline;

pub use assembly::{assemble, prepare_declaration, As3Config, AssemblyError};
pub use declaration::{as3_name, Adc, Declaration};
pub use pipeline::{Diagnostic, Pipeline, SynthesisOutput, SynthesisStage};
