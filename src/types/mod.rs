//! Core types for the uplift pipeline.

pub mod output;
pub mod provenance;
pub mod request;

pub use output::{mime, RenderedOutput, UpliftResult};
pub use provenance::{FileProvenance, ProvenanceMetadata};
pub use request::{OutputKind, UnknownOutputKind, UpliftRequest};
