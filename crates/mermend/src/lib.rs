#![forbid(unsafe_code)]

//! `mermend` turns language-model replies into Mermaid text a renderer can draw.
//!
//! The synchronous pipeline lives in `mermend-core` and is re-exported here. On top of it,
//! [`session::RenderSession`] drives an external renderer whose calls may overlap: only the most
//! recent submission is ever applied, and a render failure gets one retry with the fallback
//! diagram.

pub use mermend_core::*;

pub mod session;

#[cfg(test)]
mod tests;
