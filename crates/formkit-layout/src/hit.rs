//! Hit testing, z-order resolution, and resize handle classification.

use formkit_core::geometry::{Point, Rect};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthStr;

use crate::control::{ControlId, ParentRef};
use crate::frame::MainWindowFrame;
use crate::kind::ControlKind;
use crate::transform::{absolute_rect, container_content_rect};
use crate::tree::ControlTree;

/// Side length of the square around each resize handle.
pub const DEFAULT_HANDLE_SIZE: i32 = 16;

/// Approximate advance of one narrow glyph in a tab title.
pub const TAB_CHAR_WIDTH: i32 = 7;

/// Horizontal padding inside one tab.
pub const TAB_PADDING: i32 = 20;

/// Which visibility signals hit testing honours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityPolicy {
    /// Only the control's own `visible` flag.
    OwnFlag,
    /// The own flag, every ancestor's flag, and tab-page membership: a control
    /// on an inactive page of any ancestor tab container is hidden.
    #[default]
    Inherited,
}

/// Whether a control counts as visible for hit testing.
#[must_use]
pub fn is_effectively_visible(tree: &ControlTree, id: ControlId, policy: VisibilityPolicy) -> bool {
    let Some(node) = tree.get(id) else {
        return false;
    };
    if !node.is_visible() {
        return false;
    }
    if policy == VisibilityPolicy::OwnFlag {
        return true;
    }
    let mut child = node;
    while let ParentRef::Control(parent_id) = child.parent() {
        let Some(parent) = tree.get(parent_id) else {
            return false;
        };
        if !parent.is_visible() {
            return false;
        }
        if parent.kind() == ControlKind::TabContainer
            && child.tab_page.unwrap_or(0) != parent.current_tab().unwrap_or(0)
        {
            return false;
        }
        child = parent;
    }
    true
}

/// Topmost visible control whose absolute rectangle contains `point`.
///
/// Walks the paint order backwards, so the most recently created or
/// reparented control wins.
#[must_use]
pub fn hit_test(
    tree: &ControlTree,
    frame: &MainWindowFrame,
    point: Point,
    policy: VisibilityPolicy,
) -> Option<ControlId> {
    tree.paint_order().iter().rev().copied().find(|id| {
        is_effectively_visible(tree, *id, policy)
            && absolute_rect(tree, frame, *id).is_some_and(|rect| rect.contains(point))
    })
}

/// Deepest visible container whose absolute rectangle contains `point`.
/// For a tab container only the page below the strip counts.
///
/// Ties at the same depth go to the topmost. Controls in `exclude` (and
/// therefore the subtree being moved) are never returned.
#[must_use]
pub fn container_at(
    tree: &ControlTree,
    frame: &MainWindowFrame,
    point: Point,
    policy: VisibilityPolicy,
    exclude: &FxHashSet<ControlId>,
) -> Option<ControlId> {
    let mut best: Option<(usize, ControlId)> = None;
    for id in tree.paint_order().iter().rev().copied() {
        let Some(node) = tree.get(id) else {
            continue;
        };
        if !node.accepts_children() || exclude.contains(&id) {
            continue;
        }
        if !is_effectively_visible(tree, id, policy) {
            continue;
        }
        // Tab containers only take drops on their page, not on the strip.
        let area = if node.kind() == ControlKind::TabContainer {
            container_content_rect(tree, frame, ParentRef::Control(id))
        } else {
            absolute_rect(tree, frame, id)
        };
        if !area.is_some_and(|rect| rect.contains(point)) {
            continue;
        }
        let depth = tree.depth(id);
        if best.is_none_or(|(best_depth, _)| depth > best_depth) {
            best = Some((depth, id));
        }
    }
    best.map(|(_, id)| id)
}

/// One of the eight resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl Handle {
    /// Stable lookup order: corners before edges.
    pub const ORDER: [Handle; 8] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomRight,
        Self::BottomLeft,
        Self::Top,
        Self::Right,
        Self::Bottom,
        Self::Left,
    ];

    #[must_use]
    pub const fn is_corner(self) -> bool {
        matches!(
            self,
            Self::TopLeft | Self::TopRight | Self::BottomRight | Self::BottomLeft
        )
    }

    #[must_use]
    pub const fn frees_left(self) -> bool {
        matches!(self, Self::Left | Self::TopLeft | Self::BottomLeft)
    }

    #[must_use]
    pub const fn frees_right(self) -> bool {
        matches!(self, Self::Right | Self::TopRight | Self::BottomRight)
    }

    #[must_use]
    pub const fn frees_top(self) -> bool {
        matches!(self, Self::Top | Self::TopLeft | Self::TopRight)
    }

    #[must_use]
    pub const fn frees_bottom(self) -> bool {
        matches!(self, Self::Bottom | Self::BottomLeft | Self::BottomRight)
    }

    /// Handle center on `rect`: corners sit on the outer edges, edge
    /// handles on the edge midpoints.
    #[must_use]
    pub const fn center(self, rect: &Rect) -> Point {
        let mid = rect.center();
        let x = if self.frees_left() {
            rect.left()
        } else if self.frees_right() {
            rect.right()
        } else {
            mid.x
        };
        let y = if self.frees_top() {
            rect.top()
        } else if self.frees_bottom() {
            rect.bottom()
        } else {
            mid.y
        };
        Point::new(x, y)
    }

    /// Square hit region of this handle.
    #[must_use]
    pub const fn region(self, rect: &Rect, size: i32) -> Rect {
        let c = self.center(rect);
        let half = size / 2;
        Rect::new(c.x - half, c.y - half, size, size)
    }
}

/// Centers of all eight handles in [`Handle::ORDER`].
#[must_use]
pub fn handle_centers(rect: &Rect) -> [(Handle, Point); 8] {
    Handle::ORDER.map(|handle| (handle, handle.center(rect)))
}

/// Handle under `point`, if any.
///
/// When squares overlap (small rectangles) the handle whose center is
/// nearest wins; exact ties fall back to [`Handle::ORDER`], so a corner
/// point always resolves to its corner.
#[must_use]
pub fn handle_at(point: Point, rect: &Rect, handle_size: i32) -> Option<Handle> {
    let mut best: Option<(i64, Handle)> = None;
    for handle in Handle::ORDER {
        if !handle.region(rect, handle_size).contains(point) {
            continue;
        }
        let distance = point.distance_sq(handle.center(rect));
        if best.is_none_or(|(best_distance, _)| distance < best_distance) {
            best = Some((distance, handle));
        }
    }
    best.map(|(_, handle)| handle)
}

/// Absolute rectangles of a tab container's tabs, left to right.
///
/// Tab widths follow the display width of each title. Tabs that start past
/// the container's right edge are dropped; the last visible one is clipped.
#[must_use]
pub fn tab_strip_rects(tree: &ControlTree, frame: &MainWindowFrame, container: ControlId) -> Vec<Rect> {
    let Some(node) = tree.get(container) else {
        return Vec::new();
    };
    let Some(outer) = absolute_rect(tree, frame, container) else {
        return Vec::new();
    };
    let height = node.tab_bar_height().min(outer.height.max(0));
    let mut x = outer.x;
    let mut out = Vec::with_capacity(node.tab_count());
    for title in node.tab_titles() {
        if x >= outer.right() {
            break;
        }
        let columns = i32::try_from(title.width()).unwrap_or(i32::MAX);
        let width = columns
            .saturating_mul(TAB_CHAR_WIDTH)
            .saturating_add(TAB_PADDING)
            .min(outer.right() - x);
        out.push(Rect::new(x, outer.y, width, height));
        x = x.saturating_add(width);
    }
    out
}

/// Index of the tab under `point` in a tab container's strip.
#[must_use]
pub fn tab_at(
    tree: &ControlTree,
    frame: &MainWindowFrame,
    container: ControlId,
    point: Point,
) -> Option<usize> {
    tab_strip_rects(tree, frame, container)
        .iter()
        .position(|rect| rect.contains(point))
}
