//! Canvas tuning knobs.

use std::fmt;

use formkit_core::geometry::{Rect, Size};
use serde::{Deserialize, Serialize};

use crate::hit::{DEFAULT_HANDLE_SIZE, VisibilityPolicy};

/// Smallest size a resize may produce.
pub const DEFAULT_MIN_RESIZE: Size = Size::new(20, 20);

/// Rubber bands smaller than this on either axis do not create a control.
pub const DEFAULT_MIN_DRAW: Size = Size::new(10, 10);

/// Vertical gap between a control and its duplicate.
pub const DEFAULT_DUPLICATE_GAP: i32 = 10;

/// Canvas controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Scrollable canvas extent; bounds the window root when it is resized.
    pub canvas_size: Size,
    pub handle_size: i32,
    pub min_resize: Size,
    pub min_draw: Size,
    pub visibility: VisibilityPolicy,
    pub duplicate_gap: i32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            canvas_size: Size::new(9999, 9999),
            handle_size: DEFAULT_HANDLE_SIZE,
            min_resize: DEFAULT_MIN_RESIZE,
            min_draw: DEFAULT_MIN_DRAW,
            visibility: VisibilityPolicy::default(),
            duplicate_gap: DEFAULT_DUPLICATE_GAP,
        }
    }
}

impl CanvasConfig {
    /// Reject values that would make gestures meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.handle_size <= 0 {
            return Err(ConfigError::InvalidHandleSize {
                size: self.handle_size,
            });
        }
        for (field, size) in [("min_resize", self.min_resize), ("min_draw", self.min_draw)] {
            if size.is_empty() {
                return Err(ConfigError::InvalidMinimum { field, size });
            }
        }
        if self.canvas_size.width < self.min_resize.width
            || self.canvas_size.height < self.min_resize.height
        {
            return Err(ConfigError::CanvasTooSmall {
                size: self.canvas_size,
            });
        }
        if self.duplicate_gap < 0 {
            return Err(ConfigError::NegativeGap {
                gap: self.duplicate_gap,
            });
        }
        Ok(())
    }

    /// Canvas extent as a rectangle at the origin.
    #[must_use]
    pub const fn canvas_rect(&self) -> Rect {
        Rect::from_size(self.canvas_size)
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidHandleSize { size: i32 },
    InvalidMinimum { field: &'static str, size: Size },
    CanvasTooSmall { size: Size },
    NegativeGap { gap: i32 },
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidHandleSize { size } => write!(f, "handle size must be positive, got {size}"),
            Self::InvalidMinimum { field, size } => write!(
                f,
                "{field} must be positive on both axes, got {}x{}",
                size.width, size.height
            ),
            Self::CanvasTooSmall { size } => write!(
                f,
                "canvas {}x{} is smaller than the minimum control size",
                size.width, size.height
            ),
            Self::NegativeGap { gap } => write!(f, "duplicate gap must not be negative, got {gap}"),
            Self::Parse(message) => write!(f, "invalid canvas config: {message}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = CanvasConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.handle_size, 16);
        assert_eq!(config.visibility, VisibilityPolicy::Inherited);
    }

    #[test]
    fn rejects_degenerate_values() {
        let config = CanvasConfig {
            handle_size: 0,
            ..CanvasConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidHandleSize { size: 0 })
        );

        let config = CanvasConfig {
            min_draw: Size::new(10, 0),
            ..CanvasConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMinimum { field: "min_draw", .. })
        ));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = CanvasConfig::from_json(r#"{"visibility": "own_flag", "handle_size": 12}"#)
            .expect("valid config");
        assert_eq!(config.visibility, VisibilityPolicy::OwnFlag);
        assert_eq!(config.handle_size, 12);
        assert_eq!(config.min_resize, DEFAULT_MIN_RESIZE);

        assert!(matches!(
            CanvasConfig::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
