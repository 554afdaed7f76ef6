//! Canvas controller.
//!
//! [`Canvas`] owns the design tree, the window root, the interaction machine,
//! and the current selection. Hosts feed it pointer and key events and call
//! the property/palette operations; every mutation keeps each control inside
//! its parent's content area.

use std::fmt;
use std::path::Path;

use formkit_core::event::{Event, KeyCode, KeyEvent, PointerButton, PointerEvent, PointerEventKind};
use formkit_core::geometry::{Point, Rect, Size};
use rustc_hash::FxHashSet;

use crate::attr::{AttrKey, AttrValue, AttributeError};
use crate::codegen::generate_python;
use crate::config::{CanvasConfig, ConfigError};
use crate::control::{Control, ControlId, ParentRef, Target};
use crate::document::{Corruption, DesignDocument, LoadOutcome, PersistError, SkippedRecord};
use crate::frame::MainWindowFrame;
use crate::hit::{container_at, handle_at, hit_test, tab_at};
use crate::interaction::{
    CancelReason, InteractionEffect, InteractionMachine, InteractionState, InteractionTransition,
    NoopReason, move_rect, resize_rect,
};
use crate::kind::ControlKind;
use crate::transform::{
    absolute_rect, clamp_local, container_content_rect, content_bounds, local_bounds, target_rect,
    to_local,
};
use crate::tree::{ControlTree, LinkRepair, TreeError};

/// Errors surfaced by canvas operations.
#[derive(Debug)]
pub enum DesignerError {
    Tree(TreeError),
    Attribute(AttributeError),
    Persist(PersistError),
    Config(ConfigError),
    /// The operation needs the machine to be idle.
    InteractionActive { state: InteractionState },
    /// The requested parent cannot hold children.
    NotAContainer { id: ControlId, kind: ControlKind },
}

impl fmt::Display for DesignerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tree(err) => write!(f, "{err}"),
            Self::Attribute(err) => write!(f, "{err}"),
            Self::Persist(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
            Self::InteractionActive { state } => {
                write!(f, "operation not allowed during gesture {state:?}")
            }
            Self::NotAContainer { id, kind } => {
                write!(f, "control {id} ({kind}) cannot hold children")
            }
        }
    }
}

impl std::error::Error for DesignerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Tree(err) => Some(err),
            Self::Attribute(err) => Some(err),
            Self::Persist(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::InteractionActive { .. } | Self::NotAContainer { .. } => None,
        }
    }
}

impl From<TreeError> for DesignerError {
    fn from(err: TreeError) -> Self {
        Self::Tree(err)
    }
}

impl From<AttributeError> for DesignerError {
    fn from(err: AttributeError) -> Self {
        Self::Attribute(err)
    }
}

impl From<PersistError> for DesignerError {
    fn from(err: PersistError) -> Self {
        Self::Persist(err)
    }
}

impl From<ConfigError> for DesignerError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

/// Axis selection for [`Canvas::inherit_parent_size`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Width,
    Height,
    Both,
}

/// What a load did besides replacing the design.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Set when the file was unusable and an empty design was loaded.
    pub corruption: Option<Corruption>,
    pub skipped: Vec<SkippedRecord>,
    pub repairs: Vec<LinkRepair>,
    pub dropped_attributes: usize,
}

/// Design surface controller.
#[derive(Debug, Clone)]
pub struct Canvas {
    tree: ControlTree,
    frame: MainWindowFrame,
    config: CanvasConfig,
    machine: InteractionMachine,
    selection: Option<Target>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: ControlTree::new(),
            frame: MainWindowFrame::default(),
            config: CanvasConfig::default(),
            machine: InteractionMachine::new(),
            selection: None,
        }
    }

    pub fn with_config(config: CanvasConfig) -> Result<Self, DesignerError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    #[must_use]
    pub const fn tree(&self) -> &ControlTree {
        &self.tree
    }

    #[must_use]
    pub const fn frame(&self) -> &MainWindowFrame {
        &self.frame
    }

    #[must_use]
    pub const fn config(&self) -> &CanvasConfig {
        &self.config
    }

    #[must_use]
    pub const fn state(&self) -> InteractionState {
        self.machine.state()
    }

    #[must_use]
    pub const fn selection(&self) -> Option<Target> {
        self.selection
    }

    /// Rectangle the host should draw as a gesture preview.
    #[must_use]
    pub fn preview(&self) -> Option<Rect> {
        self.machine.state().preview()
    }

    #[must_use]
    pub fn absolute_rect(&self, id: ControlId) -> Option<Rect> {
        absolute_rect(&self.tree, &self.frame, id)
    }

    /// Absolute rectangle of a control or the window root.
    #[must_use]
    pub fn target_rect(&self, target: Target) -> Option<Rect> {
        target_rect(&self.tree, &self.frame, target)
    }

    /// Absolute area `id` must stay inside.
    #[must_use]
    pub fn content_bounds(&self, id: ControlId) -> Option<Rect> {
        content_bounds(&self.tree, &self.frame, id)
    }

    // ---- input ----

    /// Dispatch one input event.
    pub fn handle_event(&mut self, event: &Event) -> Result<InteractionTransition, DesignerError> {
        match event {
            Event::Pointer(pointer) => self.handle_pointer(pointer),
            Event::Key(key) => self.key(key),
        }
    }

    fn handle_pointer(&mut self, event: &PointerEvent) -> Result<InteractionTransition, DesignerError> {
        match event.kind {
            PointerEventKind::Down(PointerButton::Primary) => self.pointer_down(event.position),
            PointerEventKind::Move => Ok(self.pointer_move(event.position)),
            PointerEventKind::Up(PointerButton::Primary) => self.pointer_up(event.position),
            PointerEventKind::Down(_) | PointerEventKind::Up(_) => {
                Ok(self.machine.noop(NoopReason::IdleWithoutGesture))
            }
        }
    }

    /// Primary button pressed at an absolute canvas point.
    pub fn pointer_down(&mut self, point: Point) -> Result<InteractionTransition, DesignerError> {
        match self.machine.state() {
            InteractionState::Drawing { kind, .. } => Ok(self.machine.transition(
                InteractionState::Drawing {
                    kind,
                    anchor: Some(point),
                    current: point,
                },
                InteractionEffect::DrawAnchored { anchor: point },
            )),
            InteractionState::Moving { .. } | InteractionState::Resizing { .. } => {
                Ok(self.machine.noop(NoopReason::GestureInProgress))
            }
            InteractionState::Idle => self.press_idle(point),
        }
    }

    /// Priority: selection handles, the selected control's tab strip, the
    /// topmost control, the window root, empty canvas.
    fn press_idle(&mut self, point: Point) -> Result<InteractionTransition, DesignerError> {
        if let Some(target) = self.selection {
            if let Some(transition) = self.try_start_resize(target, point) {
                return Ok(transition);
            }
            if let Some(transition) = self.try_parent_tab_switch(target, point)? {
                return Ok(transition);
            }
        }

        if let Some(id) = hit_test(&self.tree, &self.frame, point, self.config.visibility) {
            let node = self.tree.require(id)?;
            let locked = node.is_locked();
            let start_local = node.local_rect;
            if node.kind() == ControlKind::TabContainer {
                if let Some(tab) = tab_at(&self.tree, &self.frame, id, point) {
                    self.switch_tab(id, tab)?;
                }
            }
            let target = Target::Control(id);
            self.selection = Some(target);
            if locked {
                return Ok(self.machine.transition(
                    InteractionState::Idle,
                    InteractionEffect::Selected {
                        target: Some(target),
                    },
                ));
            }
            let start_rect = self
                .absolute_rect(id)
                .ok_or(TreeError::UnknownControl { id })?;
            return Ok(self.machine.transition(
                InteractionState::Moving {
                    control: id,
                    origin: point,
                    start_rect,
                    start_local,
                },
                InteractionEffect::MoveStarted { control: id },
            ));
        }

        let target = self
            .frame
            .outer_rect()
            .contains(point)
            .then_some(Target::MainWindow);
        self.selection = target;
        Ok(self
            .machine
            .transition(InteractionState::Idle, InteractionEffect::Selected { target }))
    }

    fn try_start_resize(&mut self, target: Target, point: Point) -> Option<InteractionTransition> {
        if let Target::Control(id) = target {
            if self.tree.get(id).is_none_or(Control::is_locked) {
                return None;
            }
        }
        let rect = self.target_rect(target)?;
        let handle = handle_at(point, &rect, self.config.handle_size)?;
        Some(self.machine.transition(
            InteractionState::Resizing {
                target,
                handle,
                origin: point,
                start_rect: rect,
                preview: rect,
            },
            InteractionEffect::ResizeStarted { target, handle },
        ))
    }

    /// Clicking a tab of the selected control's tab container switches the
    /// page without changing the selection.
    fn try_parent_tab_switch(
        &mut self,
        target: Target,
        point: Point,
    ) -> Result<Option<InteractionTransition>, DesignerError> {
        let Some(id) = target.control() else {
            return Ok(None);
        };
        let Some(ParentRef::Control(parent)) = self.tree.parent_of(id) else {
            return Ok(None);
        };
        if self.tree.get(parent).map(Control::kind) != Some(ControlKind::TabContainer) {
            return Ok(None);
        }
        let Some(tab) = tab_at(&self.tree, &self.frame, parent, point) else {
            return Ok(None);
        };
        self.switch_tab(parent, tab)?;
        Ok(Some(self.machine.transition(
            InteractionState::Idle,
            InteractionEffect::TabSwitched {
                container: parent,
                tab,
            },
        )))
    }

    fn switch_tab(&mut self, container: ControlId, tab: usize) -> Result<(), DesignerError> {
        let node = self.tree.require_mut(container)?;
        let tab = i64::try_from(tab).unwrap_or(i64::MAX);
        node.set_attribute(AttrKey::CurrentTab, AttrValue::Int(tab))?;
        formkit_core::debug!(message = "canvas.tab_switched", container = container.get(), tab = tab);
        Ok(())
    }

    /// Pointer moved to an absolute canvas point.
    pub fn pointer_move(&mut self, point: Point) -> InteractionTransition {
        match self.machine.state() {
            InteractionState::Idle => self.machine.noop(NoopReason::IdleWithoutGesture),
            InteractionState::Drawing { anchor: None, .. } => {
                self.machine.noop(NoopReason::DrawingNotAnchored)
            }
            InteractionState::Drawing {
                kind,
                anchor: Some(anchor),
                ..
            } => self.machine.transition(
                InteractionState::Drawing {
                    kind,
                    anchor: Some(anchor),
                    current: point,
                },
                InteractionEffect::DrawPreview {
                    preview: Rect::normalized(anchor, point),
                },
            ),
            state @ InteractionState::Moving {
                control,
                origin,
                start_rect,
                ..
            } => match self.apply_move(control, origin, start_rect, point) {
                Some(local_rect) => self
                    .machine
                    .transition(state, InteractionEffect::Moved { control, local_rect }),
                None => self.cancel_removed(),
            },
            InteractionState::Resizing {
                target,
                handle,
                origin,
                start_rect,
                ..
            } => {
                let Some(bounds) = self.resize_bounds(target) else {
                    return self.cancel_removed();
                };
                let preview = resize_rect(
                    start_rect,
                    handle,
                    origin,
                    point,
                    &bounds,
                    self.resize_minimum(target),
                );
                self.machine.transition(
                    InteractionState::Resizing {
                        target,
                        handle,
                        origin,
                        start_rect,
                        preview,
                    },
                    InteractionEffect::ResizePreview { target, preview },
                )
            }
        }
    }

    /// Primary button released at an absolute canvas point.
    pub fn pointer_up(&mut self, point: Point) -> Result<InteractionTransition, DesignerError> {
        match self.machine.state() {
            InteractionState::Idle => Ok(self.machine.noop(NoopReason::IdleWithoutGesture)),
            InteractionState::Drawing { anchor: None, .. } => {
                Ok(self.machine.noop(NoopReason::DrawingNotAnchored))
            }
            InteractionState::Drawing {
                kind,
                anchor: Some(anchor),
                ..
            } => self.commit_draw(kind, Rect::normalized(anchor, point), point),
            InteractionState::Moving {
                control,
                origin,
                start_rect,
                ..
            } => match self.apply_move(control, origin, start_rect, point) {
                Some(local_rect) => {
                    formkit_core::debug!(
                        message = "canvas.move.committed",
                        id = control.get(),
                        rect = ?local_rect
                    );
                    Ok(self.machine.transition(
                        InteractionState::Idle,
                        InteractionEffect::MoveCommitted { control, local_rect },
                    ))
                }
                None => Ok(self.cancel_removed()),
            },
            InteractionState::Resizing {
                target, preview, ..
            } => match self.commit_resize(target, preview) {
                Some(rect) => {
                    formkit_core::debug!(
                        message = "canvas.resize.committed",
                        target = ?target,
                        rect = ?rect
                    );
                    Ok(self.machine.transition(
                        InteractionState::Idle,
                        InteractionEffect::ResizeCommitted { target, rect },
                    ))
                }
                None => Ok(self.cancel_removed()),
            },
        }
    }

    /// Move the control to follow the pointer; returns the new local rect.
    fn apply_move(
        &mut self,
        control: ControlId,
        origin: Point,
        start_rect: Rect,
        point: Point,
    ) -> Option<Rect> {
        let bounds = content_bounds(&self.tree, &self.frame, control)?;
        let moved = move_rect(start_rect, origin, point, &bounds);
        let parent = self.tree.parent_of(control)?;
        let local = to_local(&self.tree, &self.frame, parent, moved)?;
        self.tree.get_mut(control)?.local_rect = local;
        Some(local)
    }

    fn resize_bounds(&self, target: Target) -> Option<Rect> {
        match target {
            Target::MainWindow => Some(self.config.canvas_rect()),
            Target::Control(id) => content_bounds(&self.tree, &self.frame, id),
        }
    }

    /// The window's outer rect includes its title band, so its floor does too.
    fn resize_minimum(&self, target: Target) -> Size {
        let min = self.config.min_resize;
        match target {
            Target::MainWindow => Size::new(
                min.width,
                min.height.saturating_add(self.frame.title_height.max(0)),
            ),
            Target::Control(_) => min,
        }
    }

    fn commit_resize(&mut self, target: Target, preview: Rect) -> Option<Rect> {
        match target {
            Target::MainWindow => {
                self.frame.set_outer_rect(preview);
                self.reclamp_children(ParentRef::Root);
                Some(self.frame.outer_rect())
            }
            Target::Control(id) => {
                let parent = self.tree.parent_of(id)?;
                let local = to_local(&self.tree, &self.frame, parent, preview)?;
                let local = clamp_local(&self.tree, &self.frame, parent, local)?;
                self.tree.get_mut(id)?.local_rect = local;
                self.reclamp_children(ParentRef::Control(id));
                self.absolute_rect(id)
            }
        }
    }

    fn commit_draw(
        &mut self,
        kind: ControlKind,
        preview: Rect,
        point: Point,
    ) -> Result<InteractionTransition, DesignerError> {
        let min = self.config.min_draw;
        if preview.width < min.width || preview.height < min.height {
            return Ok(self.machine.transition(
                InteractionState::Idle,
                InteractionEffect::Canceled {
                    reason: CancelReason::PreviewTooSmall,
                },
            ));
        }
        let id = self.place(kind, preview)?;
        let local_rect = self.tree.require(id)?.local_rect;
        formkit_core::info!(
            message = "canvas.control.drawn",
            id = id.get(),
            kind = %kind,
            rect = ?local_rect
        );
        Ok(self.machine.transition(
            InteractionState::Drawing {
                kind,
                anchor: None,
                current: point,
            },
            InteractionEffect::DrawCommitted {
                control: id,
                local_rect,
            },
        ))
    }

    /// Create a control from an absolute rectangle under the deepest
    /// container holding its center, then select it.
    fn place(&mut self, kind: ControlKind, absolute: Rect) -> Result<ControlId, DesignerError> {
        let parent = container_at(
            &self.tree,
            &self.frame,
            absolute.center(),
            self.config.visibility,
            &FxHashSet::default(),
        )
        .map_or(ParentRef::Root, ParentRef::Control);
        let local = to_local(&self.tree, &self.frame, parent, absolute)
            .and_then(|local| clamp_local(&self.tree, &self.frame, parent, local))
            .unwrap_or(absolute);
        let id = self.tree.create(kind, local, parent)?;
        let page = self.page_for(parent);
        self.tree.require_mut(id)?.tab_page = page;
        self.selection = Some(Target::Control(id));
        Ok(id)
    }

    /// Current page of a tab container parent.
    fn page_for(&self, parent: ParentRef) -> Option<usize> {
        let node = self.tree.get(parent.control()?)?;
        if node.kind() != ControlKind::TabContainer {
            return None;
        }
        Some(node.current_tab().unwrap_or(0))
    }

    fn cancel_removed(&mut self) -> InteractionTransition {
        self.machine.transition(
            InteractionState::Idle,
            InteractionEffect::Canceled {
                reason: CancelReason::TargetRemoved,
            },
        )
    }

    /// Key press: Escape cancels a gesture, Delete/Backspace removes the
    /// selected control.
    pub fn key(&mut self, event: &KeyEvent) -> Result<InteractionTransition, DesignerError> {
        let escape = InteractionEffect::Canceled {
            reason: CancelReason::EscapeKey,
        };
        match (self.machine.state(), event.code) {
            (InteractionState::Moving { control, start_local, .. }, KeyCode::Escape) => {
                if let Some(node) = self.tree.get_mut(control) {
                    node.local_rect = start_local;
                }
                Ok(self.machine.transition(InteractionState::Idle, escape))
            }
            (
                InteractionState::Drawing { .. } | InteractionState::Resizing { .. },
                KeyCode::Escape,
            ) => Ok(self.machine.transition(InteractionState::Idle, escape)),
            (InteractionState::Idle, KeyCode::Delete | KeyCode::Backspace) => {
                match self.selection.and_then(Target::control) {
                    Some(id) => {
                        let removed = self.request_delete(id)?;
                        Ok(self
                            .machine
                            .transition(InteractionState::Idle, InteractionEffect::Deleted { removed }))
                    }
                    None => Ok(self.machine.noop(NoopReason::UnhandledKey)),
                }
            }
            _ => Ok(self.machine.noop(NoopReason::UnhandledKey)),
        }
    }

    /// Abort any gesture. A live move is rolled back.
    pub fn cancel(&mut self) -> Option<InteractionTransition> {
        if let InteractionState::Moving {
            control,
            start_local,
            ..
        } = self.machine.state()
        {
            if let Some(node) = self.tree.get_mut(control) {
                node.local_rect = start_local;
            }
        }
        self.machine.force_cancel(CancelReason::Programmatic)
    }

    // ---- palette ----

    /// Arm drawing mode for `kind`. Re-arming while drawing switches kind.
    pub fn request_create(&mut self, kind: ControlKind) -> Result<InteractionTransition, DesignerError> {
        if !kind.is_placeable() {
            return Err(TreeError::RootNotAllowed.into());
        }
        match self.machine.state() {
            InteractionState::Idle | InteractionState::Drawing { .. } => {}
            state => return Err(DesignerError::InteractionActive { state }),
        }
        Ok(self.machine.transition(
            InteractionState::Drawing {
                kind,
                anchor: None,
                current: Point::ORIGIN,
            },
            InteractionEffect::DrawArmed { kind },
        ))
    }

    /// Drop a palette item at `point` with its default size, centered.
    pub fn drop_control(&mut self, kind: ControlKind, point: Point) -> Result<ControlId, DesignerError> {
        if !kind.is_placeable() {
            return Err(TreeError::RootNotAllowed.into());
        }
        self.require_not_gesturing()?;
        let size = kind.behavior().default_size();
        let absolute = Rect::new(
            point.x.saturating_sub(size.width / 2),
            point.y.saturating_sub(size.height / 2),
            size.width,
            size.height,
        );
        let id = self.place(kind, absolute)?;
        formkit_core::info!(message = "canvas.control.dropped", id = id.get(), kind = %kind);
        Ok(id)
    }

    // ---- selection and properties ----

    pub fn select(&mut self, target: Option<Target>) -> Result<(), DesignerError> {
        if let Some(Target::Control(id)) = target {
            self.tree.require(id)?;
        }
        self.selection = target;
        Ok(())
    }

    pub fn attribute(&self, id: ControlId, key: AttrKey) -> Result<Option<&AttrValue>, DesignerError> {
        Ok(self.tree.require(id)?.attributes.get(key))
    }

    /// Validated attribute write.
    ///
    /// Changing a tab container's font or strip height re-clamps its
    /// children; changing its titles pulls children off removed pages.
    pub fn set_attribute(
        &mut self,
        id: ControlId,
        key: AttrKey,
        value: impl Into<AttrValue>,
    ) -> Result<(), DesignerError> {
        let node = self.tree.require_mut(id)?;
        node.set_attribute(key, value.into())?;
        if node.kind() != ControlKind::TabContainer {
            return Ok(());
        }
        match key {
            AttrKey::FontSize | AttrKey::TabBarHeight => {
                self.reclamp_children(ParentRef::Control(id));
            }
            AttrKey::TabTitles => {
                let count = node.tab_count();
                let children = node.children().to_vec();
                for child in children {
                    if let Some(child) = self.tree.get_mut(child) {
                        child.tab_page = Some(child.tab_page.filter(|page| *page < count).unwrap_or(0));
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    pub fn rename(&mut self, id: ControlId, name: impl Into<String>) -> Result<(), DesignerError> {
        self.tree.require_mut(id)?.name = name.into();
        Ok(())
    }

    /// Local rectangle of a control.
    pub fn rect(&self, id: ControlId) -> Result<Rect, DesignerError> {
        Ok(self.tree.require(id)?.local_rect)
    }

    /// Set a local rectangle from the property panel. The value is clamped
    /// into the parent's content area and descendants are re-clamped.
    pub fn set_rect(&mut self, id: ControlId, local: Rect) -> Result<Rect, DesignerError> {
        self.require_not_gesturing()?;
        let parent = self.tree.require(id)?.parent();
        let clamped = clamp_local(&self.tree, &self.frame, parent, local)
            .ok_or(TreeError::UnknownControl { id })?;
        self.tree.require_mut(id)?.local_rect = clamped;
        self.reclamp_children(ParentRef::Control(id));
        Ok(clamped)
    }

    /// Replace the window root's properties; root children are re-clamped.
    pub fn set_frame(&mut self, frame: MainWindowFrame) -> Result<(), DesignerError> {
        self.require_not_gesturing()?;
        self.frame = frame;
        self.reclamp_children(ParentRef::Root);
        Ok(())
    }

    /// Grow (or shrink) a control to its parent's content size on `axis`.
    pub fn inherit_parent_size(&mut self, id: ControlId, axis: Axis) -> Result<Rect, DesignerError> {
        let node = self.tree.require(id)?;
        let parent = node.parent();
        let rect = node.local_rect;
        let bounds = local_bounds(&self.tree, &self.frame, parent)
            .ok_or(TreeError::UnknownControl { id })?;
        let (width, height) = match axis {
            Axis::Width => (bounds.width, rect.height),
            Axis::Height => (rect.width, bounds.height),
            Axis::Both => (bounds.width, bounds.height),
        };
        self.set_rect(id, Rect::new(rect.x, rect.y, width, height))
    }

    // ---- structure ----

    /// Parents `id` may move under: the root plus every container outside
    /// its own subtree.
    pub fn reparent_candidates(&self, id: ControlId) -> Result<Vec<ParentRef>, DesignerError> {
        self.tree.require(id)?;
        let excluded = self.tree.reparent_exclusion(id);
        let mut out = vec![ParentRef::Root];
        out.extend(
            self.tree
                .iter()
                .filter(|node| node.accepts_children() && !excluded.contains(&node.id()))
                .map(|node| ParentRef::Control(node.id())),
        );
        Ok(out)
    }

    /// Move `id` under `new_parent`, keeping its absolute position where the
    /// new content area allows. Returns the new local rectangle.
    pub fn request_reparent(&mut self, id: ControlId, new_parent: ParentRef) -> Result<Rect, DesignerError> {
        self.require_not_gesturing()?;
        if let ParentRef::Control(parent) = new_parent {
            let target = self.tree.require(parent)?;
            if !target.accepts_children() {
                return Err(DesignerError::NotAContainer {
                    id: parent,
                    kind: target.kind(),
                });
            }
        }
        let absolute = self
            .absolute_rect(id)
            .ok_or(TreeError::UnknownControl { id })?;
        self.tree.reparent(id, new_parent)?;

        let local = to_local(&self.tree, &self.frame, new_parent, absolute)
            .and_then(|local| clamp_local(&self.tree, &self.frame, new_parent, local))
            .ok_or(TreeError::UnknownControl { id })?;
        let page = self.page_for(new_parent);
        let node = self.tree.require_mut(id)?;
        node.local_rect = local;
        node.tab_page = page;
        self.reclamp_children(ParentRef::Control(id));
        formkit_core::info!(
            message = "canvas.control.reparented",
            id = id.get(),
            parent = ?new_parent,
            rect = ?local
        );
        Ok(local)
    }

    /// Delete a control and its subtree. A gesture on a removed control is
    /// canceled and a removed selection is cleared.
    pub fn request_delete(&mut self, id: ControlId) -> Result<Vec<ControlId>, DesignerError> {
        let removed: Vec<ControlId> = self.tree.remove(id)?.iter().map(Control::id).collect();
        let gone = |target: Option<Target>| {
            target
                .and_then(Target::control)
                .is_some_and(|id| removed.contains(&id))
        };
        if gone(self.machine.state().subject()) {
            self.machine.force_cancel(CancelReason::TargetRemoved);
        }
        if gone(self.selection) {
            self.selection = None;
        }
        formkit_core::info!(message = "canvas.control.deleted", id = id.get(), cascade = removed.len());
        Ok(removed)
    }

    /// Copy a control (attributes and events, not children) under the same
    /// parent, just below the original, and select the copy.
    pub fn duplicate(&mut self, id: ControlId) -> Result<ControlId, DesignerError> {
        self.require_not_gesturing()?;
        let source = self.tree.require(id)?.clone();
        let parent = source.parent();
        let shifted = source.local_rect.translate(
            0,
            source
                .local_rect
                .height
                .saturating_add(self.config.duplicate_gap),
        );
        let local = clamp_local(&self.tree, &self.frame, parent, shifted).unwrap_or(shifted);

        let new_id = self.tree.allocate_id()?;
        let mut copy = Control::new(new_id, source.kind(), self.tree.default_name(source.kind()), local);
        copy.attributes = source.attributes;
        copy.events = source.events;
        copy.tab_page = source.tab_page;
        self.tree.insert(copy, parent, None)?;
        self.selection = Some(Target::Control(new_id));
        formkit_core::info!(message = "canvas.control.duplicated", source = id.get(), id = new_id.get());
        Ok(new_id)
    }

    /// Re-clamp every descendant of `parent` into its (possibly changed)
    /// content area, top-down.
    fn reclamp_children(&mut self, parent: ParentRef) {
        let mut stack = vec![parent];
        while let Some(parent) = stack.pop() {
            let Some(bounds) = local_bounds(&self.tree, &self.frame, parent) else {
                continue;
            };
            let children = self.tree.children_of(parent).to_vec();
            for child in children {
                if let Some(node) = self.tree.get_mut(child) {
                    node.local_rect = node.local_rect.clamp_into(&bounds);
                }
                stack.push(ParentRef::Control(child));
            }
        }
    }

    // ---- project ----

    /// Start a new, empty design.
    pub fn clear(&mut self) {
        self.cancel();
        self.tree = ControlTree::new();
        self.frame = MainWindowFrame::default();
        self.selection = None;
        formkit_core::info!(message = "canvas.cleared");
    }

    #[must_use]
    pub fn document(&self) -> DesignDocument {
        DesignDocument::capture(&self.tree, &self.frame)
    }

    /// Replace the design with a document's content.
    ///
    /// Every control is clamped into its parent after linking, so a
    /// hand-edited file cannot break containment.
    pub fn load_document(&mut self, document: &DesignDocument) -> Result<LoadReport, DesignerError> {
        self.require_idle()?;
        let restored = document.restore()?;
        self.tree = restored.tree;
        self.frame = restored.frame;
        self.selection = None;
        self.reclamp_children(ParentRef::Root);
        if !restored.repairs.is_empty() {
            formkit_core::warn!(message = "canvas.load.repaired", repairs = ?restored.repairs);
        }
        Ok(LoadReport {
            corruption: None,
            skipped: Vec::new(),
            repairs: restored.repairs,
            dropped_attributes: restored.dropped_attributes,
        })
    }

    /// Save the design; `*.fkpack` paths use the packed envelope.
    pub fn save(&self, path: &Path) -> Result<(), DesignerError> {
        self.require_idle()?;
        self.document().save(path)?;
        Ok(())
    }

    /// Load a design file. Unusable content yields an empty design and a
    /// report saying why.
    pub fn load(&mut self, path: &Path) -> Result<LoadReport, DesignerError> {
        self.require_idle()?;
        let (document, corruption, skipped) = match DesignDocument::load(path)? {
            LoadOutcome::Loaded { document, skipped } => (document, None, skipped),
            LoadOutcome::Recovered { document, reason } => (document, Some(reason), Vec::new()),
        };
        let mut report = self.load_document(&document)?;
        report.corruption = corruption;
        report.skipped = skipped;
        formkit_core::info!(
            message = "canvas.loaded",
            path = %path.display(),
            controls = self.tree.len()
        );
        Ok(report)
    }

    /// PyQt5 source for the current design.
    #[must_use]
    pub fn generate_code(&self) -> String {
        generate_python(&self.tree, &self.frame)
    }

    /// Absolute content rectangle of a container or the window root.
    #[must_use]
    pub fn container_content_rect(&self, parent: ParentRef) -> Option<Rect> {
        container_content_rect(&self.tree, &self.frame, parent)
    }

    fn require_idle(&self) -> Result<(), DesignerError> {
        let state = self.machine.state();
        if state.is_idle() {
            Ok(())
        } else {
            Err(DesignerError::InteractionActive { state })
        }
    }

    fn require_not_gesturing(&self) -> Result<(), DesignerError> {
        match self.machine.state() {
            state @ (InteractionState::Moving { .. } | InteractionState::Resizing { .. }) => {
                Err(DesignerError::InteractionActive { state })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hit::Handle;

    fn canvas() -> Canvas {
        Canvas::new()
    }

    fn create(canvas: &mut Canvas, kind: ControlKind, abs: Rect) -> ControlId {
        canvas.request_create(kind).expect("arm");
        canvas.pointer_down(abs.origin()).expect("down");
        canvas.pointer_move(Point::new(abs.right(), abs.bottom()));
        let t = canvas
            .pointer_up(Point::new(abs.right(), abs.bottom()))
            .expect("up");
        canvas.cancel();
        match t.effect {
            InteractionEffect::DrawCommitted { control, .. } => control,
            other => panic!("expected commit, got {other:?}"),
        }
    }

    #[test]
    fn drawing_commits_and_stays_armed() {
        let mut canvas = canvas();
        canvas.request_create(ControlKind::Button).expect("arm");
        canvas.pointer_down(Point::new(100, 100)).expect("down");
        let preview = canvas.pointer_move(Point::new(180, 140));
        assert_eq!(
            preview.effect,
            InteractionEffect::DrawPreview {
                preview: Rect::new(100, 100, 80, 40)
            }
        );
        let t = canvas.pointer_up(Point::new(180, 140)).expect("up");
        let InteractionEffect::DrawCommitted { control, local_rect } = t.effect else {
            panic!("expected commit");
        };
        assert_eq!(local_rect, Rect::new(100, 70, 80, 40));
        assert!(matches!(
            canvas.state(),
            InteractionState::Drawing { anchor: None, .. }
        ));
        assert_eq!(canvas.selection(), Some(Target::Control(control)));
    }

    #[test]
    fn tiny_rubber_band_returns_to_idle() {
        let mut canvas = canvas();
        canvas.request_create(ControlKind::Label).expect("arm");
        canvas.pointer_down(Point::new(100, 100)).expect("down");
        let t = canvas.pointer_up(Point::new(105, 150)).expect("up");
        assert_eq!(
            t.effect,
            InteractionEffect::Canceled {
                reason: CancelReason::PreviewTooSmall
            }
        );
        assert!(canvas.tree().is_empty());
        assert!(canvas.state().is_idle());
    }

    #[test]
    fn drawing_inside_container_nests() {
        let mut canvas = canvas();
        let group = create(&mut canvas, ControlKind::TitledContainer, Rect::new(50, 80, 300, 200));
        let label = create(&mut canvas, ControlKind::Label, Rect::new(60, 110, 50, 30));
        assert_eq!(
            canvas.tree().parent_of(label),
            Some(ParentRef::Control(group))
        );
        // 80 absolute top, +15 title band, label at 110.
        assert_eq!(canvas.rect(label).expect("rect"), Rect::new(10, 15, 50, 30));
    }

    #[test]
    fn drawing_on_tab_strip_stays_at_root() {
        let mut canvas = canvas();
        let tabs = create(&mut canvas, ControlKind::TabContainer, Rect::new(50, 80, 300, 200));
        // The strip spans absolute y 80..110; this draw is centered at y 95.
        let label = create(&mut canvas, ControlKind::Label, Rect::new(250, 85, 40, 20));
        assert_eq!(canvas.tree().parent_of(label), Some(ParentRef::Root));
        assert_eq!(canvas.rect(label).expect("rect"), Rect::new(250, 55, 40, 20));

        let below = create(&mut canvas, ControlKind::Label, Rect::new(250, 120, 40, 20));
        assert_eq!(canvas.tree().parent_of(below), Some(ParentRef::Control(tabs)));
    }

    #[test]
    fn move_is_clamped_and_escape_restores() {
        let mut canvas = canvas();
        let button = create(&mut canvas, ControlKind::Button, Rect::new(100, 100, 80, 40));
        let start = canvas.rect(button).expect("rect");

        canvas.pointer_down(Point::new(120, 120)).expect("down");
        assert!(matches!(canvas.state(), InteractionState::Moving { .. }));
        canvas.pointer_move(Point::new(-5000, -5000));
        assert_eq!(canvas.rect(button).expect("rect").origin(), Point::ORIGIN);

        let esc = canvas.key(&KeyEvent::new(KeyCode::Escape)).expect("esc");
        assert_eq!(
            esc.effect,
            InteractionEffect::Canceled {
                reason: CancelReason::EscapeKey
            }
        );
        assert_eq!(canvas.rect(button).expect("rect"), start);
    }

    #[test]
    fn resize_from_handle_commits_on_release() {
        let mut canvas = canvas();
        let button = create(&mut canvas, ControlKind::Button, Rect::new(100, 100, 80, 40));
        let abs = canvas.absolute_rect(button).expect("abs");
        let corner = Handle::BottomRight.center(&abs);

        let t = canvas.pointer_down(corner).expect("down");
        assert_eq!(
            t.effect,
            InteractionEffect::ResizeStarted {
                target: Target::Control(button),
                handle: Handle::BottomRight
            }
        );
        canvas.pointer_move(Point::new(corner.x + 20, corner.y + 10));
        let t = canvas
            .pointer_up(Point::new(corner.x + 20, corner.y + 10))
            .expect("up");
        assert!(matches!(t.effect, InteractionEffect::ResizeCommitted { .. }));
        assert_eq!(canvas.rect(button).expect("rect").size(), Size::new(100, 50));
    }

    #[test]
    fn locked_control_selects_without_moving() {
        let mut canvas = canvas();
        let button = create(&mut canvas, ControlKind::Button, Rect::new(100, 100, 80, 40));
        canvas
            .set_attribute(button, AttrKey::Locked, true)
            .expect("lock");
        canvas.select(None).expect("deselect");
        let t = canvas.pointer_down(Point::new(120, 120)).expect("down");
        assert_eq!(
            t.effect,
            InteractionEffect::Selected {
                target: Some(Target::Control(button))
            }
        );
        assert!(canvas.state().is_idle());
    }

    #[test]
    fn clicking_empty_window_then_outside() {
        let mut canvas = canvas();
        let t = canvas.pointer_down(Point::new(400, 300)).expect("down");
        assert_eq!(
            t.effect,
            InteractionEffect::Selected {
                target: Some(Target::MainWindow)
            }
        );
        let t = canvas.pointer_down(Point::new(5000, 5000)).expect("down");
        assert_eq!(t.effect, InteractionEffect::Selected { target: None });
    }

    #[test]
    fn delete_key_cascades_and_clears_selection() {
        let mut canvas = canvas();
        let frame = create(&mut canvas, ControlKind::PlainContainer, Rect::new(50, 80, 300, 200));
        let inner = create(&mut canvas, ControlKind::Checkbox, Rect::new(60, 90, 80, 30));
        canvas.select(Some(Target::Control(frame))).expect("select");
        let t = canvas.key(&KeyEvent::new(KeyCode::Delete)).expect("delete");
        assert_eq!(
            t.effect,
            InteractionEffect::Deleted {
                removed: vec![frame, inner]
            }
        );
        assert!(canvas.tree().is_empty());
        assert_eq!(canvas.selection(), None);
    }

    #[test]
    fn reparent_keeps_absolute_position() {
        let mut canvas = canvas();
        let group = create(&mut canvas, ControlKind::TitledContainer, Rect::new(50, 80, 300, 200));
        let button = create(&mut canvas, ControlKind::Button, Rect::new(400, 100, 80, 40));
        let before = canvas.absolute_rect(button).expect("abs");

        let candidates = canvas.reparent_candidates(group).expect("candidates");
        assert_eq!(candidates, vec![ParentRef::Root]);

        canvas
            .request_reparent(button, ParentRef::Control(group))
            .expect("reparent");
        let after = canvas.absolute_rect(button).expect("abs");
        // Clamped horizontally into the group, vertical position kept.
        assert_eq!(after.y, before.y);
        assert!(
            canvas
                .content_bounds(button)
                .expect("bounds")
                .contains_rect(&after)
        );

        let err = canvas
            .request_reparent(group, ParentRef::Control(button))
            .expect_err("button cannot hold children");
        assert!(matches!(err, DesignerError::NotAContainer { .. }));
    }

    #[test]
    fn shrinking_container_reclamps_children() {
        let mut canvas = canvas();
        let group = create(&mut canvas, ControlKind::PlainContainer, Rect::new(50, 80, 300, 200));
        let button = create(&mut canvas, ControlKind::Button, Rect::new(250, 200, 80, 40));
        canvas
            .set_rect(group, Rect::new(20, 50, 100, 60))
            .expect("shrink");
        let child = canvas.absolute_rect(button).expect("abs");
        assert!(
            canvas
                .content_bounds(button)
                .expect("bounds")
                .contains_rect(&child)
        );
    }

    #[test]
    fn duplicate_lands_below_original() {
        let mut canvas = canvas();
        let button = create(&mut canvas, ControlKind::Button, Rect::new(100, 100, 80, 40));
        canvas
            .set_attribute(button, AttrKey::Text, "OK")
            .expect("text");
        let copy = canvas.duplicate(button).expect("dup");
        let original = canvas.rect(button).expect("rect");
        let copied = canvas.rect(copy).expect("rect");
        assert_eq!(copied.y, original.y + 40 + 10);
        assert_eq!(
            canvas.attribute(copy, AttrKey::Text).expect("attr"),
            Some(&AttrValue::from("OK"))
        );
        assert_ne!(canvas.tree().require(copy).expect("copy").name, canvas.tree().require(button).expect("btn").name);
    }

    #[test]
    fn inherit_parent_width() {
        let mut canvas = canvas();
        let group = create(&mut canvas, ControlKind::PlainContainer, Rect::new(50, 80, 300, 200));
        let button = create(&mut canvas, ControlKind::Button, Rect::new(100, 100, 80, 40));
        let rect = canvas.inherit_parent_size(button, Axis::Width).expect("inherit");
        assert_eq!(rect.width, 300);
        assert_eq!(rect.x, 0);
        assert_eq!(canvas.tree().parent_of(button), Some(ParentRef::Control(group)));
    }

    #[test]
    fn save_rejected_mid_gesture() {
        let mut canvas = canvas();
        canvas.request_create(ControlKind::Button).expect("arm");
        let dir = tempfile::tempdir().expect("tempdir");
        let err = canvas
            .save(&dir.path().join("form.json"))
            .expect_err("drawing is not idle");
        assert!(matches!(err, DesignerError::InteractionActive { .. }));
    }

    #[test]
    fn request_create_rejects_window_root() {
        let mut canvas = canvas();
        assert!(matches!(
            canvas.request_create(ControlKind::MainWindow),
            Err(DesignerError::Tree(TreeError::RootNotAllowed))
        ));
    }

    #[test]
    fn drop_rejects_window_root_before_anything_else() {
        let mut canvas = canvas();
        let button = create(&mut canvas, ControlKind::Button, Rect::new(100, 100, 80, 40));
        canvas.pointer_down(Point::new(120, 120)).expect("down");
        assert!(matches!(canvas.state(), InteractionState::Moving { .. }));
        assert!(matches!(
            canvas.drop_control(ControlKind::MainWindow, Point::new(300, 300)),
            Err(DesignerError::Tree(TreeError::RootNotAllowed))
        ));
        assert!(matches!(
            canvas.drop_control(ControlKind::Label, Point::new(300, 300)),
            Err(DesignerError::InteractionActive { .. })
        ));
        assert_eq!(canvas.tree().paint_order(), &[button]);
    }
}
