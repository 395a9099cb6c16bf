//! Types shared between the DXF design client crates: the design request model,
//! the wire protocol of the generation service and its error bodies.

pub mod domain;
pub mod error;
pub mod protocol;
