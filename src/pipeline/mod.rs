//! The three pipeline stages, one module per execution context.
//!
//! - `enumerate`: child-process registry snapshot (I/O context)
//! - `sample`: OS working-set measurement (blocking context)
//! - `classify`: renderer matching and refinement (UI context)
//!
//! Each stage is a plain function over the record set; the orchestrator
//! in [`crate::details`] sequences them onto the right contexts.

pub(crate) mod classify;
pub(crate) mod enumerate;
pub(crate) mod sample;
