#![forbid(unsafe_code)]

//! Form layout model and designer canvas.
//!
//! # Role in formkit
//! Everything between raw input and a saved design lives here: control kinds
//! and their attributes, the control tree arena, the window root, the
//! local/absolute geometry model, hit testing, the interaction state machine,
//! the canvas controller, persistence, and code generation.
//!
//! # Coordinates
//! A control's rectangle is stored relative to its parent's *content area*
//! (below a tab strip or title band). Absolute rectangles are always derived
//! by walking the parent chain; nothing caches them.

pub mod attr;
pub mod canvas;
pub mod codegen;
pub mod config;
pub mod control;
pub mod document;
pub mod frame;
pub mod hit;
pub mod interaction;
pub mod kind;
pub mod transform;
pub mod tree;

pub use attr::{AttrKey, AttrSet, AttrType, AttrValue, Attributes, AttributeError};
pub use canvas::{Axis, Canvas, DesignerError, LoadReport};
pub use codegen::generate_python;
pub use config::{CanvasConfig, ConfigError};
pub use control::{Control, ControlId, EventBinding, ParentRef, Target};
pub use document::{
    ControlRecord, Corruption, DesignDocument, Envelope, LoadOutcome, PersistError, SkippedRecord,
};
pub use frame::{GridSettings, MainWindowFrame};
pub use hit::{Handle, VisibilityPolicy};
pub use interaction::{
    CancelReason, InteractionEffect, InteractionMachine, InteractionState, InteractionTransition,
    NoopReason,
};
pub use kind::{ControlBehavior, ControlKind};
pub use tree::{ControlTree, LinkRepair, TreeError};
