#![forbid(unsafe_code)]

//! formkit public facade crate.
//!
//! Re-exports the designer surface from the internal crates, a unified
//! [`Error`] type, and a small prelude. Hosts own rendering and widgets;
//! they translate native input into [`Event`]s, feed them to a [`Canvas`],
//! and draw from the canvas' tree, frame, selection and preview.

use std::fmt;
use std::path::Path;

// --- Core re-exports -------------------------------------------------------

pub use formkit_core::event::{
    Event, KeyCode, KeyEvent, Modifiers, PointerButton, PointerEvent, PointerEventKind,
};
pub use formkit_core::geometry::{Point, Rect, Sides, Size};

// --- Layout re-exports -----------------------------------------------------

pub use formkit_layout::{
    AttrKey, AttrSet, AttrType, AttrValue, AttributeError, Attributes, Axis, CancelReason, Canvas,
    CanvasConfig, ConfigError, Control, ControlBehavior, ControlId, ControlKind, ControlRecord,
    ControlTree, Corruption, DesignDocument, DesignerError, Envelope, EventBinding, GridSettings,
    Handle, InteractionEffect, InteractionMachine, InteractionState, InteractionTransition,
    LinkRepair, LoadOutcome, LoadReport, MainWindowFrame, NoopReason, ParentRef, PersistError,
    SkippedRecord, Target, TreeError, VisibilityPolicy, generate_python,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for formkit hosts.
#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Tree(TreeError),
    Attribute(AttributeError),
    Persist(PersistError),
    Config(ConfigError),
    Designer(DesignerError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Tree(err) => write!(f, "{err}"),
            Self::Attribute(err) => write!(f, "{err}"),
            Self::Persist(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
            Self::Designer(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Tree(err) => Some(err),
            Self::Attribute(err) => Some(err),
            Self::Persist(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::Designer(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<TreeError> for Error {
    fn from(err: TreeError) -> Self {
        Self::Tree(err)
    }
}

impl From<AttributeError> for Error {
    fn from(err: AttributeError) -> Self {
        Self::Attribute(err)
    }
}

impl From<PersistError> for Error {
    fn from(err: PersistError) -> Self {
        Self::Persist(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

/// Designer errors that merely wrap a lower layer are unwrapped.
impl From<DesignerError> for Error {
    fn from(err: DesignerError) -> Self {
        match err {
            DesignerError::Tree(err) => Self::Tree(err),
            DesignerError::Attribute(err) => Self::Attribute(err),
            DesignerError::Persist(err) => Self::Persist(err),
            DesignerError::Config(err) => Self::Config(err),
            other => Self::Designer(other),
        }
    }
}

/// Standard result type for formkit APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Convenience ------------------------------------------------------------

/// Build a canvas from a JSON configuration file. Missing keys take their
/// defaults.
pub fn canvas_from_config_file(path: &Path) -> Result<Canvas> {
    let text = std::fs::read_to_string(path)?;
    let config = CanvasConfig::from_json(&text)?;
    Ok(Canvas::with_config(config)?)
}

/// Install the JSON tracing subscriber (honours `RUST_LOG`).
#[cfg(feature = "tracing-json")]
pub fn init_json_logging() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    formkit_core::logging::init_json_logging()
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        AttrKey, AttrValue, Canvas, CanvasConfig, ControlId, ControlKind, DesignDocument, Error,
        Event, InteractionEffect, InteractionState, KeyCode, KeyEvent, MainWindowFrame, ParentRef,
        Point, PointerEvent, Rect, Result, Size, Target,
    };

    pub use crate::{core, layout};
}

pub use formkit_core as core;
pub use formkit_layout as layout;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn designer_errors_unwrap_lower_layers() {
        let err: Error = DesignerError::Tree(TreeError::RootNotAllowed).into();
        assert!(matches!(err, Error::Tree(TreeError::RootNotAllowed)));

        let err: Error = DesignerError::InteractionActive {
            state: InteractionState::Idle,
        }
        .into();
        assert!(matches!(err, Error::Designer(_)));
        assert!(err.to_string().contains("gesture"));
    }

    #[test]
    fn config_file_builds_canvas() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("canvas.json");
        std::fs::write(&path, r#"{"handle_size": 10, "visibility": "own_flag"}"#).expect("write");
        let canvas = canvas_from_config_file(&path).expect("canvas");
        assert_eq!(canvas.config().handle_size, 10);
        assert_eq!(canvas.config().visibility, VisibilityPolicy::OwnFlag);

        std::fs::write(&path, r#"{"handle_size": -1}"#).expect("write");
        assert!(matches!(
            canvas_from_config_file(&path),
            Err(Error::Config(ConfigError::InvalidHandleSize { size: -1 }))
        ));
        assert!(matches!(
            canvas_from_config_file(&dir.path().join("missing.json")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn prelude_drives_a_session() {
        use crate::prelude::*;

        let mut canvas = Canvas::new();
        canvas.request_create(ControlKind::Button).expect("arm");
        for event in [
            Event::Pointer(PointerEvent::down(100, 100)),
            Event::Pointer(PointerEvent::moved(160, 140)),
            Event::Pointer(PointerEvent::up(160, 140)),
        ] {
            canvas.handle_event(&event).expect("event");
        }
        assert_eq!(canvas.tree().len(), 1);
        let code = canvas.generate_code();
        assert!(code.contains("QPushButton(self.centralwidget)"));
    }
}
