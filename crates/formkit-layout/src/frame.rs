//! The synthetic main-window root.

use formkit_core::geometry::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Default title band height of the window root.
pub const DEFAULT_TITLE_HEIGHT: i32 = 30;

/// Design-grid display settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    #[serde(rename = "grid_enabled")]
    pub enabled: bool,
    #[serde(rename = "grid_spacing")]
    pub spacing: i32,
    #[serde(rename = "grid_start_x")]
    pub start_x: i32,
    #[serde(rename = "grid_start_y")]
    pub start_y: i32,
    #[serde(rename = "grid_color")]
    pub color: String,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            spacing: 8,
            start_x: 3,
            start_y: 1,
            color: "#C8C8C8".to_string(),
        }
    }
}

/// Root container of a design session.
///
/// Children of the root are positioned relative to its content area, which
/// starts below the title band: origin `(x, y + title_height)`, size
/// `(width, height)`. The outer rectangle includes the band.
///
/// Serialized as one flat key/value object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MainWindowFrame {
    pub name: String,
    pub title: String,
    pub x: i32,
    pub y: i32,
    /// Content width.
    pub width: i32,
    /// Content height, excluding the title band.
    pub height: i32,
    pub title_height: i32,
    pub background_color: String,
    pub title_color: String,
    pub title_text_color: String,
    /// Use the platform's window decoration instead of the drawn title band.
    pub native_chrome: bool,
    #[serde(flatten)]
    pub grid: GridSettings,
}

impl Default for MainWindowFrame {
    fn default() -> Self {
        Self {
            name: "MainWindow".to_string(),
            title: "MainWindow".to_string(),
            x: 0,
            y: 0,
            width: 800,
            height: 600,
            title_height: DEFAULT_TITLE_HEIGHT,
            background_color: "#F0F0F0".to_string(),
            title_color: "#0066CC".to_string(),
            title_text_color: "#FFFFFF".to_string(),
            native_chrome: false,
            grid: GridSettings::default(),
        }
    }
}

impl MainWindowFrame {
    /// Origin of the content area in canvas coordinates.
    #[must_use]
    pub const fn content_origin(&self) -> Point {
        Point::new(self.x, self.y.saturating_add(self.title_height))
    }

    /// Area available to root children, in canvas coordinates.
    #[must_use]
    pub fn content_area(&self) -> Rect {
        let origin = self.content_origin();
        Rect::new(origin.x, origin.y, self.width.max(0), self.height.max(0))
    }

    /// Window rectangle including the title band.
    #[must_use]
    pub fn outer_rect(&self) -> Rect {
        Rect::new(
            self.x,
            self.y,
            self.width.max(0),
            self.height.max(0).saturating_add(self.title_height.max(0)),
        )
    }

    /// Apply a resized outer rectangle: the band stays, the content absorbs the change.
    pub fn set_outer_rect(&mut self, outer: Rect) {
        self.x = outer.x;
        self.y = outer.y;
        self.width = outer.width.max(0);
        self.height = outer.height.saturating_sub(self.title_height).max(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let frame = MainWindowFrame::default();
        assert_eq!(frame.content_area(), Rect::new(0, 30, 800, 600));
        assert_eq!(frame.outer_rect(), Rect::new(0, 0, 800, 630));
    }

    #[test]
    fn outer_rect_round_trips() {
        let mut frame = MainWindowFrame {
            x: 20,
            y: 40,
            ..MainWindowFrame::default()
        };
        frame.set_outer_rect(Rect::new(25, 45, 400, 330));
        assert_eq!(frame.width, 400);
        assert_eq!(frame.height, 300);
        assert_eq!(frame.outer_rect(), Rect::new(25, 45, 400, 330));
        assert_eq!(frame.content_origin(), Point::new(25, 75));
    }

    #[test]
    fn short_outer_rect_floors_content_height() {
        let mut frame = MainWindowFrame::default();
        frame.set_outer_rect(Rect::new(0, 0, 100, 10));
        assert_eq!(frame.height, 0);
    }

    #[test]
    fn serializes_flat_and_tolerates_missing_keys() {
        let frame = MainWindowFrame::default();
        let value = serde_json::to_value(&frame).expect("serialize");
        assert_eq!(value["grid_spacing"], 8);
        assert_eq!(value["title_height"], 30);

        let partial: MainWindowFrame =
            serde_json::from_str(r#"{"width": 640, "grid_enabled": false}"#).expect("partial");
        assert_eq!(partial.width, 640);
        assert_eq!(partial.height, 600);
        assert!(!partial.grid.enabled);
        assert_eq!(partial.grid.spacing, 8);
    }
}
