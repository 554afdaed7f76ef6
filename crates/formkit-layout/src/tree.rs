//! Arena-backed control tree.
//!
//! Controls are stored by [`ControlId`]; parents are [`ParentRef`] values and
//! children are ordered id lists, so the tree has no ownership cycles and
//! serializes naturally.
//!
//! Besides the per-parent z-order the tree keeps a flat *paint order*: the
//! order controls were created or last reparented in. Hit testing walks it
//! backwards so the most recent control wins.

use std::collections::BTreeMap;
use std::fmt;

use formkit_core::geometry::Rect;
use rustc_hash::FxHashSet;

use crate::control::{Control, ControlId, ControlIdAllocator, ParentRef};
use crate::kind::ControlKind;

/// Structural errors for control tree operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    ZeroControlId,
    IdOverflow {
        current: ControlId,
    },
    UnknownControl {
        id: ControlId,
    },
    DuplicateId {
        id: ControlId,
    },
    /// The window root cannot be inserted as a control.
    RootNotAllowed,
    /// Reparenting would make a control its own ancestor.
    CycleRejected {
        id: ControlId,
        new_parent: ControlId,
    },
    ParentMismatch {
        id: ControlId,
        expected: ParentRef,
        actual: ParentRef,
    },
    Orphan {
        id: ControlId,
    },
    CycleDetected {
        id: ControlId,
    },
    PaintOrderMismatch {
        expected: usize,
        actual: usize,
    },
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroControlId => write!(f, "control id 0 is invalid"),
            Self::IdOverflow { current } => {
                write!(f, "control id space exhausted after {}", current.get())
            }
            Self::UnknownControl { id } => write!(f, "control {} not found", id.get()),
            Self::DuplicateId { id } => write!(f, "duplicate control id {}", id.get()),
            Self::RootNotAllowed => write!(f, "the main window cannot be placed as a control"),
            Self::CycleRejected { id, new_parent } => write!(
                f,
                "cannot move control {} under its own descendant {}",
                id.get(),
                new_parent.get()
            ),
            Self::ParentMismatch {
                id,
                expected,
                actual,
            } => write!(
                f,
                "control {} parent mismatch: expected {expected:?}, got {actual:?}",
                id.get()
            ),
            Self::Orphan { id } => {
                write!(f, "control {} is not listed by its parent", id.get())
            }
            Self::CycleDetected { id } => {
                write!(f, "cycle detected at control {}", id.get())
            }
            Self::PaintOrderMismatch { expected, actual } => write!(
                f,
                "paint order lists {actual} controls, tree holds {expected}"
            ),
        }
    }
}

impl std::error::Error for TreeError {}

/// A parent link that could not be honoured while assembling a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRepair {
    /// The referenced parent does not exist.
    MissingParent { id: ControlId, parent: ControlId },
    /// The control named itself as parent.
    SelfParent { id: ControlId },
    /// Following the requested links would loop back to the control.
    CycleBroken { id: ControlId, parent: ControlId },
}

/// The owned hierarchy of controls under the window root.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControlTree {
    nodes: BTreeMap<ControlId, Control>,
    root_children: Vec<ControlId>,
    paint_order: Vec<ControlId>,
    allocator: ControlIdAllocator,
}

impl ControlTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: ControlId) -> bool {
        self.nodes.contains_key(&id)
    }

    #[must_use]
    pub fn get(&self, id: ControlId) -> Option<&Control> {
        self.nodes.get(&id)
    }

    /// Mutable access to a control's non-structural fields.
    pub fn get_mut(&mut self, id: ControlId) -> Option<&mut Control> {
        self.nodes.get_mut(&id)
    }

    /// Look up a control, failing with [`TreeError::UnknownControl`].
    pub fn require(&self, id: ControlId) -> Result<&Control, TreeError> {
        self.get(id).ok_or(TreeError::UnknownControl { id })
    }

    pub fn require_mut(&mut self, id: ControlId) -> Result<&mut Control, TreeError> {
        self.get_mut(id).ok_or(TreeError::UnknownControl { id })
    }

    /// Next id the allocator would hand out.
    #[must_use]
    pub fn next_id(&self) -> ControlId {
        self.allocator.peek()
    }

    pub fn allocate_id(&mut self) -> Result<ControlId, TreeError> {
        self.allocator.allocate()
    }

    /// Controls in paint order (earliest first).
    #[must_use]
    pub fn paint_order(&self) -> &[ControlId] {
        &self.paint_order
    }

    /// Controls in paint order.
    pub fn iter(&self) -> impl Iterator<Item = &Control> {
        self.paint_order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Children of a parent in z-order.
    #[must_use]
    pub fn children_of(&self, parent: ParentRef) -> &[ControlId] {
        match parent {
            ParentRef::Root => &self.root_children,
            ParentRef::Control(id) => self.get(id).map_or(&[], |node| node.children()),
        }
    }

    #[must_use]
    pub fn parent_of(&self, id: ControlId) -> Option<ParentRef> {
        self.get(id).map(Control::parent)
    }

    /// Ancestors from the immediate parent upward (root excluded).
    #[must_use]
    pub fn ancestors(&self, id: ControlId) -> Vec<ControlId> {
        let mut out = Vec::new();
        let mut cursor = self.parent_of(id);
        while let Some(ParentRef::Control(parent)) = cursor {
            if out.len() > self.nodes.len() {
                break;
            }
            out.push(parent);
            cursor = self.parent_of(parent);
        }
        out
    }

    /// Number of control ancestors (0 for root children).
    #[must_use]
    pub fn depth(&self, id: ControlId) -> usize {
        self.ancestors(id).len()
    }

    /// Descendants in depth-first pre-order, excluding `id` itself.
    #[must_use]
    pub fn descendants(&self, id: ControlId) -> Vec<ControlId> {
        let mut out = Vec::new();
        let mut stack: Vec<ControlId> = self
            .children_of(ParentRef::Control(id))
            .iter()
            .rev()
            .copied()
            .collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children_of(ParentRef::Control(next)).iter().rev().copied());
        }
        out
    }

    /// True if `ancestor` lies on the parent chain of `id`.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: ControlId, id: ControlId) -> bool {
        self.ancestors(id).contains(&ancestor)
    }

    /// `{id} ∪ descendants(id)`: the controls `id` may not be reparented into.
    #[must_use]
    pub fn reparent_exclusion(&self, id: ControlId) -> FxHashSet<ControlId> {
        let mut set: FxHashSet<ControlId> = self.descendants(id).into_iter().collect();
        set.insert(id);
        set
    }

    /// Number of controls of one kind.
    #[must_use]
    pub fn count_of_kind(&self, kind: ControlKind) -> usize {
        self.nodes.values().filter(|node| node.kind() == kind).count()
    }

    /// First free `<Label>_<NNN>` name for a new control of `kind`.
    #[must_use]
    pub fn default_name(&self, kind: ControlKind) -> String {
        let taken: FxHashSet<&str> = self.nodes.values().map(|node| node.name.as_str()).collect();
        let mut n = self.count_of_kind(kind) + 1;
        loop {
            let candidate = format!("{}_{n:03}", kind.label());
            if !taken.contains(candidate.as_str()) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Allocate an id and insert a new control at the end of `parent`.
    pub fn create(
        &mut self,
        kind: ControlKind,
        local_rect: Rect,
        parent: ParentRef,
    ) -> Result<ControlId, TreeError> {
        if !kind.is_placeable() {
            return Err(TreeError::RootNotAllowed);
        }
        self.require_parent(parent)?;
        let id = self.allocate_id()?;
        let name = self.default_name(kind);
        self.insert(Control::new(id, kind, name, local_rect), parent, None)
    }

    /// Insert an unlinked control under `parent` at `index` (default: end).
    ///
    /// Any children listed on the incoming control are discarded.
    pub fn insert(
        &mut self,
        mut control: Control,
        parent: ParentRef,
        index: Option<usize>,
    ) -> Result<ControlId, TreeError> {
        if !control.kind().is_placeable() {
            return Err(TreeError::RootNotAllowed);
        }
        let id = control.id();
        if self.nodes.contains_key(&id) {
            return Err(TreeError::DuplicateId { id });
        }
        self.require_parent(parent)?;
        self.allocator.observe(id)?;

        control.parent = parent;
        control.children.clear();
        self.nodes.insert(id, control);
        let siblings = self.children_list_mut(parent);
        let at = index.map_or(siblings.len(), |index| index.min(siblings.len()));
        siblings.insert(at, id);
        self.paint_order.push(id);

        formkit_core::debug!(message = "tree.insert", id = id.get(), parent = ?parent);
        Ok(id)
    }

    /// Remove a control and all its descendants.
    ///
    /// Each control is detached from its own parent before its children are
    /// visited. Returns the removed controls in removal order.
    pub fn remove(&mut self, id: ControlId) -> Result<Vec<Control>, TreeError> {
        self.require(id)?;
        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let Some(node) = self.nodes.get(&next) else {
                continue;
            };
            let parent = node.parent();
            self.detach(next, parent);
            let Some(node) = self.nodes.remove(&next) else {
                continue;
            };
            stack.extend(node.children.iter().rev().copied());
            removed.push(node);
        }
        let gone: FxHashSet<ControlId> = removed.iter().map(Control::id).collect();
        self.paint_order.retain(|id| !gone.contains(id));

        formkit_core::debug!(message = "tree.remove", id = id.get(), cascade = removed.len());
        Ok(removed)
    }

    /// Move a control (and its subtree) under a new parent, on top of its new
    /// siblings. Geometry is not touched.
    pub fn reparent(&mut self, id: ControlId, new_parent: ParentRef) -> Result<(), TreeError> {
        self.require(id)?;
        self.require_parent(new_parent)?;
        let closes_cycle = match new_parent {
            ParentRef::Root => None,
            ParentRef::Control(target) => {
                (target == id || self.is_ancestor(id, target)).then_some(target)
            }
        };
        if let Some(target) = closes_cycle {
            formkit_core::warn!(
                message = "tree.reparent.rejected",
                id = id.get(),
                new_parent = target.get()
            );
            return Err(TreeError::CycleRejected {
                id,
                new_parent: target,
            });
        }

        let old_parent = self.require(id)?.parent();
        self.detach(id, old_parent);
        self.children_list_mut(new_parent).push(id);
        self.require_mut(id)?.parent = new_parent;

        let subtree = self.reparent_exclusion(id);
        let (moved, kept): (Vec<ControlId>, Vec<ControlId>) = self
            .paint_order
            .iter()
            .copied()
            .partition(|node| subtree.contains(node));
        self.paint_order = kept;
        self.paint_order.extend(moved);
        Ok(())
    }

    /// Drop every control. The id allocator keeps counting.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root_children.clear();
        self.paint_order.clear();
    }

    /// Check structural invariants: parent/child agreement, no cycles, no
    /// orphans, and a paint order that lists every control exactly once.
    pub fn validate(&self) -> Result<(), TreeError> {
        let mut listed: FxHashSet<ControlId> = FxHashSet::default();
        let parents = std::iter::once(ParentRef::Root)
            .chain(self.nodes.keys().map(|id| ParentRef::Control(*id)));
        for parent in parents {
            for child in self.children_of(parent) {
                let node = self.require(*child)?;
                if node.parent() != parent {
                    return Err(TreeError::ParentMismatch {
                        id: *child,
                        expected: parent,
                        actual: node.parent(),
                    });
                }
                if !listed.insert(*child) {
                    return Err(TreeError::DuplicateId { id: *child });
                }
            }
        }
        for id in self.nodes.keys() {
            if !listed.contains(id) {
                return Err(TreeError::Orphan { id: *id });
            }
            let mut steps = 0;
            let mut cursor = self.nodes[id].parent();
            while let ParentRef::Control(parent) = cursor {
                steps += 1;
                if parent == *id || steps > self.nodes.len() {
                    return Err(TreeError::CycleDetected { id: *id });
                }
                cursor = self.require(parent)?.parent();
            }
        }
        let painted: FxHashSet<ControlId> = self.paint_order.iter().copied().collect();
        if painted.len() != self.paint_order.len()
            || painted.len() != self.nodes.len()
            || !self.nodes.keys().all(|id| painted.contains(id))
        {
            return Err(TreeError::PaintOrderMismatch {
                expected: self.nodes.len(),
                actual: self.paint_order.len(),
            });
        }
        Ok(())
    }

    /// Build a tree from unlinked controls and their requested parents.
    ///
    /// Pass one registers every control so forward references resolve. Pass
    /// two links each control to its requested parent in input order,
    /// attaching it to the root instead when the parent is missing, is the
    /// control itself, or would close a cycle. Input order becomes both the
    /// sibling order and the paint order. Duplicate ids keep the first
    /// occurrence; an id the allocator cannot advance past is dropped.
    pub fn assemble(
        entries: Vec<(Control, Option<ControlId>)>,
    ) -> Result<(Self, Vec<LinkRepair>), TreeError> {
        let mut tree = Self::new();
        let mut order = Vec::with_capacity(entries.len());
        let mut requested: BTreeMap<ControlId, Option<ControlId>> = BTreeMap::new();

        for (mut control, parent) in entries {
            let id = control.id();
            if !control.kind().is_placeable() || tree.nodes.contains_key(&id) {
                formkit_core::warn!(message = "tree.assemble.skip", id = id.get());
                continue;
            }
            if tree.allocator.observe(id).is_err() {
                formkit_core::warn!(message = "tree.assemble.id_exhausted", id = id.get());
                continue;
            }
            control.parent = ParentRef::Root;
            control.children.clear();
            tree.nodes.insert(id, control);
            requested.insert(id, parent);
            order.push(id);
        }

        let mut repairs = Vec::new();
        let mut resolved: BTreeMap<ControlId, ParentRef> = BTreeMap::new();
        for id in &order {
            let parent = match requested.get(id).copied().flatten() {
                None => ParentRef::Root,
                Some(parent) if parent == *id => {
                    repairs.push(LinkRepair::SelfParent { id: *id });
                    ParentRef::Root
                }
                Some(parent) if !tree.nodes.contains_key(&parent) => {
                    repairs.push(LinkRepair::MissingParent { id: *id, parent });
                    ParentRef::Root
                }
                Some(parent) => ParentRef::Control(parent),
            };
            resolved.insert(*id, parent);
        }

        // Break cycles in input order: walk the tentative chain upward and
        // detach the control that closes a loop.
        for id in &order {
            let mut cursor = resolved.get(id).copied().unwrap_or_default();
            let mut steps = 0;
            while let ParentRef::Control(parent) = cursor {
                steps += 1;
                if parent == *id {
                    if let Some(ParentRef::Control(requested_parent)) = resolved.get(id).copied() {
                        repairs.push(LinkRepair::CycleBroken {
                            id: *id,
                            parent: requested_parent,
                        });
                    }
                    resolved.insert(*id, ParentRef::Root);
                    break;
                }
                // A loop further up is broken when its first member comes round.
                if steps > order.len() {
                    break;
                }
                cursor = resolved.get(&parent).copied().unwrap_or_default();
            }
        }

        for id in &order {
            let parent = resolved.get(id).copied().unwrap_or_default();
            tree.children_list_mut(parent).push(*id);
            if let Some(node) = tree.nodes.get_mut(id) {
                node.parent = parent;
            }
        }
        tree.paint_order = order;

        if !repairs.is_empty() {
            formkit_core::warn!(message = "tree.assemble.relinked", repairs = ?repairs);
        }
        Ok((tree, repairs))
    }

    fn require_parent(&self, parent: ParentRef) -> Result<(), TreeError> {
        match parent {
            ParentRef::Root => Ok(()),
            ParentRef::Control(id) => self.require(id).map(|_| ()),
        }
    }

    fn detach(&mut self, id: ControlId, parent: ParentRef) {
        match parent {
            ParentRef::Root => self.root_children.retain(|child| *child != id),
            ParentRef::Control(parent) => {
                if let Some(node) = self.nodes.get_mut(&parent) {
                    node.children.retain(|child| *child != id);
                }
            }
        }
    }

    /// Sibling list of a parent already known to exist.
    fn children_list_mut(&mut self, parent: ParentRef) -> &mut Vec<ControlId> {
        match parent {
            ParentRef::Root => &mut self.root_children,
            ParentRef::Control(id) => match self.nodes.get_mut(&id) {
                Some(node) => &mut node.children,
                None => &mut self.root_children,
            },
        }
    }
}
