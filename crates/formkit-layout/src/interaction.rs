//! Canvas interaction lifecycle.
//!
//! ```text
//! Idle --request_create--> Drawing --pointer-up (commit)--> Drawing
//!   |                        \--Escape / tiny preview--> Idle
//!   +--pointer-down on body----> Moving   --pointer-up / Escape--> Idle
//!   +--pointer-down on handle--> Resizing --pointer-up / Escape--> Idle
//! ```
//!
//! [`InteractionMachine`] owns the state and numbers every transition. The
//! canvas controller decides *which* transition to take (it owns the tree);
//! the pure gesture math lives in [`move_rect`] and [`resize_rect`].

use formkit_core::geometry::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

use crate::control::{ControlId, Target};
use crate::hit::Handle;
use crate::kind::ControlKind;

/// Transient canvas state. At most one gesture is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum InteractionState {
    #[default]
    Idle,
    /// Armed by the palette. `anchor` is set while the pointer is held.
    Drawing {
        kind: ControlKind,
        anchor: Option<Point>,
        current: Point,
    },
    Moving {
        control: ControlId,
        origin: Point,
        /// Absolute rectangle at pointer-down.
        start_rect: Rect,
        /// Local rectangle at pointer-down, restored on cancel.
        start_local: Rect,
    },
    Resizing {
        target: Target,
        handle: Handle,
        origin: Point,
        /// Absolute rectangle at pointer-down.
        start_rect: Rect,
        /// Live preview, committed on pointer-up.
        preview: Rect,
    },
}

impl InteractionState {
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Preview rectangle a host should draw: the rubber band while drawing,
    /// the pending rectangle while resizing.
    #[must_use]
    pub fn preview(&self) -> Option<Rect> {
        match self {
            Self::Drawing {
                anchor: Some(anchor),
                current,
                ..
            } => Some(Rect::normalized(*anchor, *current)),
            Self::Resizing { preview, .. } => Some(*preview),
            _ => None,
        }
    }

    /// Control the active gesture manipulates, if any.
    #[must_use]
    pub const fn subject(&self) -> Option<Target> {
        match self {
            Self::Moving { control, .. } => Some(Target::Control(*control)),
            Self::Resizing { target, .. } => Some(*target),
            _ => None,
        }
    }
}

/// Why an input produced no state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoopReason {
    IdleWithoutGesture,
    GestureInProgress,
    DrawingNotAnchored,
    TargetLocked,
    UnhandledKey,
}

/// Why a gesture ended without a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    EscapeKey,
    PreviewTooSmall,
    /// The manipulated control disappeared (deleted, project cleared).
    TargetRemoved,
    Programmatic,
}

/// Effect emitted by one lifecycle step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum InteractionEffect {
    DrawArmed {
        kind: ControlKind,
    },
    DrawAnchored {
        anchor: Point,
    },
    DrawPreview {
        preview: Rect,
    },
    DrawCommitted {
        control: ControlId,
        local_rect: Rect,
    },
    Selected {
        target: Option<Target>,
    },
    TabSwitched {
        container: ControlId,
        tab: usize,
    },
    MoveStarted {
        control: ControlId,
    },
    Moved {
        control: ControlId,
        local_rect: Rect,
    },
    MoveCommitted {
        control: ControlId,
        local_rect: Rect,
    },
    ResizeStarted {
        target: Target,
        handle: Handle,
    },
    ResizePreview {
        target: Target,
        preview: Rect,
    },
    ResizeCommitted {
        target: Target,
        rect: Rect,
    },
    Deleted {
        removed: Vec<ControlId>,
    },
    Canceled {
        reason: CancelReason,
    },
    Noop {
        reason: NoopReason,
    },
}

/// One state-machine transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionTransition {
    pub transition_id: u64,
    pub from: InteractionState,
    pub to: InteractionState,
    pub effect: InteractionEffect,
}

/// Owner of the interaction state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionMachine {
    state: InteractionState,
    transition_counter: u64,
}

impl InteractionMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> InteractionState {
        self.state
    }

    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.state.is_idle()
    }

    /// Number of transitions taken so far.
    #[must_use]
    pub const fn transition_count(&self) -> u64 {
        self.transition_counter
    }

    /// Move to `to`, recording `effect`.
    pub fn transition(
        &mut self,
        to: InteractionState,
        effect: InteractionEffect,
    ) -> InteractionTransition {
        let from = self.state;
        self.state = to;
        self.transition_counter = self.transition_counter.saturating_add(1);
        formkit_core::trace!(
            message = "interaction.transition",
            transition_id = self.transition_counter,
            from = ?from,
            to = ?to
        );
        InteractionTransition {
            transition_id: self.transition_counter,
            from,
            to,
            effect,
        }
    }

    /// Record an input that leaves the state untouched.
    pub fn noop(&mut self, reason: NoopReason) -> InteractionTransition {
        let state = self.state;
        self.transition(state, InteractionEffect::Noop { reason })
    }

    /// Unconditionally return to Idle.
    ///
    /// Returns `None` if the machine was already idle. Callers that need to
    /// undo a live move must do so before calling this.
    pub fn force_cancel(&mut self, reason: CancelReason) -> Option<InteractionTransition> {
        if self.state.is_idle() {
            return None;
        }
        Some(self.transition(
            InteractionState::Idle,
            InteractionEffect::Canceled { reason },
        ))
    }
}

/// Candidate rectangle for a move: the start rectangle shifted by the pointer
/// delta, then clamped into `bounds`.
#[must_use]
pub fn move_rect(start_rect: Rect, origin: Point, current: Point, bounds: &Rect) -> Rect {
    let (dx, dy) = current.delta_from(origin);
    start_rect.translate(dx, dy).clamp_into(bounds)
}

/// Preview rectangle for a resize.
///
/// Only the edges `handle` frees follow the pointer delta. Each freed edge
/// is clamped into `bounds` on its own, so hitting one wall does not pin the
/// opposite edge. A span below `min_size` is restored by pulling the dragged
/// edge back toward the fixed one. The result is finally clamped into
/// `bounds` as a whole.
#[must_use]
pub fn resize_rect(
    start_rect: Rect,
    handle: Handle,
    origin: Point,
    current: Point,
    bounds: &Rect,
    min_size: Size,
) -> Rect {
    let (dx, dy) = current.delta_from(origin);
    let mut left = start_rect.left();
    let mut top = start_rect.top();
    let mut right = start_rect.right();
    let mut bottom = start_rect.bottom();

    if handle.frees_left() {
        left = left.saturating_add(dx).clamp(bounds.left(), bounds.right());
    }
    if handle.frees_right() {
        right = right.saturating_add(dx).clamp(bounds.left(), bounds.right());
    }
    if handle.frees_top() {
        top = top.saturating_add(dy).clamp(bounds.top(), bounds.bottom());
    }
    if handle.frees_bottom() {
        bottom = bottom.saturating_add(dy).clamp(bounds.top(), bounds.bottom());
    }

    if right.saturating_sub(left) < min_size.width {
        if handle.frees_left() {
            left = right.saturating_sub(min_size.width);
        } else if handle.frees_right() {
            right = left.saturating_add(min_size.width);
        }
    }
    if bottom.saturating_sub(top) < min_size.height {
        if handle.frees_top() {
            top = bottom.saturating_sub(min_size.height);
        } else if handle.frees_bottom() {
            bottom = top.saturating_add(min_size.height);
        }
    }

    Rect::from_edges(left, top, right, bottom).clamp_into(bounds)
}
