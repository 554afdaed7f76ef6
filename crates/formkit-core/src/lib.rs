#![forbid(unsafe_code)]

//! Core: geometry primitives, canonical input events, and logging.
//!
//! # Role in formkit
//! `formkit-core` is the leaf crate. It owns the coordinate types every other
//! layer speaks ([`geometry::Rect`], [`geometry::Point`]) and the normalized
//! pointer/key events a host feeds into the designer canvas.
//!
//! # How it fits in the system
//! `formkit-layout` builds the control tree, geometry model, hit testing, and
//! interaction machine on top of these types. Hosts only need to translate
//! their native input into [`event::Event`] values.

pub mod event;
pub mod geometry;
pub mod logging;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, error, info, trace, warn};
