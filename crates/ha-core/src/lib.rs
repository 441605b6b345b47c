//! Core types for the Home Assistant host surface
//!
//! This crate provides the types an integration sees when the host hands it
//! work: the [`Context`] that tracks who asked for something, and the
//! [`ServiceCall`] that carries a service request together with its target.

mod context;
mod service_call;

pub use context::Context;
pub use service_call::{ServiceCall, SupportsResponse, ATTR_CONFIG_ENTRY_ID, ATTR_ENTITY_ID};
