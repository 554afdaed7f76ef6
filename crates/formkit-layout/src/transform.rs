//! Local ↔ absolute coordinate transforms.
//!
//! A control's `local_rect` is relative to its parent's content-area origin.
//! Everything here recomputes from the tree on every call: an ancestor may
//! have moved since the last event, so nothing is cached.
//!
//! All functions return `None` only for ids that are not in the tree.

use formkit_core::geometry::{Point, Rect};

use crate::control::{ControlId, ParentRef, Target};
use crate::frame::MainWindowFrame;
use crate::tree::ControlTree;

/// Absolute origin of a parent's content area.
///
/// Walks up the chain adding each ancestor's local origin plus its content
/// offset (tab strip, title band), ending at the window's content origin.
#[must_use]
pub fn content_origin(tree: &ControlTree, frame: &MainWindowFrame, parent: ParentRef) -> Option<Point> {
    let (mut dx, mut dy) = (0_i32, 0_i32);
    let mut cursor = parent;
    let mut steps = 0_usize;
    loop {
        match cursor {
            ParentRef::Root => {
                let origin = frame.content_origin();
                return Some(Point::new(
                    origin.x.saturating_add(dx),
                    origin.y.saturating_add(dy),
                ));
            }
            ParentRef::Control(id) => {
                let node = tree.get(id)?;
                let inset = node.content_area();
                dx = dx
                    .saturating_add(node.local_rect.x)
                    .saturating_add(inset.x);
                dy = dy
                    .saturating_add(node.local_rect.y)
                    .saturating_add(inset.y);
                cursor = node.parent();
                steps += 1;
                if steps > tree.len() {
                    return None;
                }
            }
        }
    }
}

/// A control's rectangle in canvas coordinates.
#[must_use]
pub fn absolute_rect(tree: &ControlTree, frame: &MainWindowFrame, id: ControlId) -> Option<Rect> {
    let node = tree.get(id)?;
    let origin = content_origin(tree, frame, node.parent())?;
    Some(node.local_rect.translate(origin.x, origin.y))
}

/// Absolute rectangle of a control or of the window's outer frame.
#[must_use]
pub fn target_rect(tree: &ControlTree, frame: &MainWindowFrame, target: Target) -> Option<Rect> {
    match target {
        Target::MainWindow => Some(frame.outer_rect()),
        Target::Control(id) => absolute_rect(tree, frame, id),
    }
}

/// Absolute content area a parent offers its children.
#[must_use]
pub fn container_content_rect(
    tree: &ControlTree,
    frame: &MainWindowFrame,
    parent: ParentRef,
) -> Option<Rect> {
    match parent {
        ParentRef::Root => Some(frame.content_area()),
        ParentRef::Control(id) => {
            let node = tree.get(id)?;
            let outer = absolute_rect(tree, frame, id)?;
            Some(node.content_area().translate(outer.x, outer.y))
        }
    }
}

/// Bounds a control must stay within: its parent's absolute content area.
#[must_use]
pub fn content_bounds(tree: &ControlTree, frame: &MainWindowFrame, id: ControlId) -> Option<Rect> {
    let node = tree.get(id)?;
    container_content_rect(tree, frame, node.parent())
}

/// Convert an absolute rectangle into `parent`'s local space.
#[must_use]
pub fn to_local(
    tree: &ControlTree,
    frame: &MainWindowFrame,
    parent: ParentRef,
    absolute: Rect,
) -> Option<Rect> {
    let origin = content_origin(tree, frame, parent)?;
    Some(absolute.translate(origin.x.saturating_neg(), origin.y.saturating_neg()))
}

/// Convert a rectangle in `parent`'s local space to canvas coordinates.
#[must_use]
pub fn to_absolute(
    tree: &ControlTree,
    frame: &MainWindowFrame,
    parent: ParentRef,
    local: Rect,
) -> Option<Rect> {
    let origin = content_origin(tree, frame, parent)?;
    Some(local.translate(origin.x, origin.y))
}

/// Parent content bounds expressed in the parent's own local space.
#[must_use]
pub fn local_bounds(tree: &ControlTree, frame: &MainWindowFrame, parent: ParentRef) -> Option<Rect> {
    let content = container_content_rect(tree, frame, parent)?;
    Some(Rect::new(0, 0, content.width, content.height))
}

/// Clamp a local rectangle into `parent`'s content area: shrink to fit, then
/// pull the origin inside.
#[must_use]
pub fn clamp_local(
    tree: &ControlTree,
    frame: &MainWindowFrame,
    parent: ParentRef,
    local: Rect,
) -> Option<Rect> {
    let bounds = local_bounds(tree, frame, parent)?;
    Some(local.clamp_into(&bounds))
}
