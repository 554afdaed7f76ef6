//! Control identity and node data.

use std::fmt;

use formkit_core::geometry::{Rect, Size};
use serde::{Deserialize, Serialize};

use crate::attr::{AttrKey, AttrValue, AttributeError, Attributes};
use crate::kind::{ControlKind, TabContainer, tab_bar_height_for_font};
use crate::tree::TreeError;

/// Stable identifier for controls.
///
/// `0` is reserved/invalid so IDs are always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControlId(u64);

impl ControlId {
    /// Lowest valid control ID.
    pub const MIN: Self = Self(1);

    /// Create a new control ID, rejecting 0.
    pub fn new(raw: u64) -> Result<Self, TreeError> {
        if raw == 0 {
            return Err(TreeError::ZeroControlId);
        }
        Ok(Self(raw))
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Return the next ID, or an error on overflow.
    pub fn checked_next(self) -> Result<Self, TreeError> {
        let Some(next) = self.0.checked_add(1) else {
            return Err(TreeError::IdOverflow { current: self });
        };
        Self::new(next)
    }
}

impl Default for ControlId {
    fn default() -> Self {
        Self::MIN
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Deterministic control ID allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlIdAllocator {
    next: ControlId,
}

impl ControlIdAllocator {
    /// Start allocating from a known ID.
    #[must_use]
    pub const fn with_next(next: ControlId) -> Self {
        Self { next }
    }

    /// Peek at the next ID without consuming.
    #[must_use]
    pub const fn peek(&self) -> ControlId {
        self.next
    }

    /// Allocate the next ID and advance.
    pub fn allocate(&mut self) -> Result<ControlId, TreeError> {
        let current = self.next;
        self.next = self.next.checked_next()?;
        Ok(current)
    }

    /// Make sure `seen` is never handed out again.
    pub fn observe(&mut self, seen: ControlId) -> Result<(), TreeError> {
        if seen >= self.next {
            self.next = seen.checked_next()?;
        }
        Ok(())
    }
}

impl Default for ControlIdAllocator {
    fn default() -> Self {
        Self {
            next: ControlId::MIN,
        }
    }
}

/// Where a control hangs in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentRef {
    /// Direct child of the window root.
    #[default]
    Root,
    Control(ControlId),
}

impl ParentRef {
    #[must_use]
    pub const fn control(self) -> Option<ControlId> {
        match self {
            Self::Root => None,
            Self::Control(id) => Some(id),
        }
    }
}

impl From<Option<ControlId>> for ParentRef {
    fn from(value: Option<ControlId>) -> Self {
        value.map_or(Self::Root, Self::Control)
    }
}

/// Anything that can be selected or resized: a control or the window root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "target", content = "id", rename_all = "snake_case")]
pub enum Target {
    MainWindow,
    Control(ControlId),
}

impl Target {
    #[must_use]
    pub const fn control(self) -> Option<ControlId> {
        match self {
            Self::MainWindow => None,
            Self::Control(id) => Some(id),
        }
    }
}

/// A signal connection carried for code generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventBinding {
    /// Signal name, e.g. `clicked`.
    pub event: String,
    /// Callback expression, emitted verbatim.
    pub callback: String,
}

impl EventBinding {
    #[must_use]
    pub fn new(event: impl Into<String>, callback: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            callback: callback.into(),
        }
    }
}

/// One node of the design tree.
///
/// Structural fields (`id`, `kind`, `parent`, `children`) are owned by
/// [`crate::tree::ControlTree`] and only readable from outside the crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub(crate) id: ControlId,
    pub(crate) kind: ControlKind,
    pub(crate) parent: ParentRef,
    pub(crate) children: Vec<ControlId>,
    /// User-visible object name.
    pub name: String,
    /// Rectangle relative to the parent's content-area origin.
    pub local_rect: Rect,
    /// Page of the parent tab container this control sits on.
    pub tab_page: Option<usize>,
    pub attributes: Attributes,
    pub events: Vec<EventBinding>,
}

impl Control {
    /// New unlinked control with the kind's default attributes.
    #[must_use]
    pub fn new(id: ControlId, kind: ControlKind, name: impl Into<String>, local_rect: Rect) -> Self {
        Self {
            id,
            kind,
            parent: ParentRef::Root,
            children: Vec::new(),
            name: name.into(),
            local_rect,
            tab_page: None,
            attributes: kind.behavior().default_attributes(),
            events: Vec::new(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> ControlId {
        self.id
    }

    #[must_use]
    pub const fn kind(&self) -> ControlKind {
        self.kind
    }

    #[must_use]
    pub const fn parent(&self) -> ParentRef {
        self.parent
    }

    /// Children in z-order (later = on top).
    #[must_use]
    pub fn children(&self) -> &[ControlId] {
        &self.children
    }

    /// The control's own visibility flag.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.attributes.bool_or(AttrKey::Visible, true)
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.attributes.bool_or(AttrKey::Locked, false)
    }

    #[must_use]
    pub fn accepts_children(&self) -> bool {
        self.kind.accepts_children()
    }

    /// Content area relative to the control's own origin.
    #[must_use]
    pub fn content_area(&self) -> Rect {
        self.kind
            .behavior()
            .content_area(self.local_rect.size(), &self.attributes)
    }

    /// Tab titles of a tab container; empty for other kinds.
    #[must_use]
    pub fn tab_titles(&self) -> &[String] {
        if self.kind == ControlKind::TabContainer {
            self.attributes.list(AttrKey::TabTitles)
        } else {
            &[]
        }
    }

    #[must_use]
    pub fn tab_count(&self) -> usize {
        self.tab_titles().len()
    }

    /// Active page of a tab container, clamped into range.
    #[must_use]
    pub fn current_tab(&self) -> Option<usize> {
        let count = self.tab_count();
        if count == 0 {
            return None;
        }
        let raw = self.attributes.int(AttrKey::CurrentTab).unwrap_or(0);
        Some(usize::try_from(raw).unwrap_or(0).min(count - 1))
    }

    /// Tab strip height of a tab container; zero for other kinds.
    #[must_use]
    pub fn tab_bar_height(&self) -> i32 {
        if self.kind == ControlKind::TabContainer {
            TabContainer::tab_bar_height(&self.attributes)
        } else {
            0
        }
    }

    #[must_use]
    pub fn default_size(&self) -> Size {
        self.kind.behavior().default_size()
    }

    /// Check a write against the kind's attribute table.
    pub fn check_attribute(&self, key: AttrKey, value: &AttrValue) -> Result<(), AttributeError> {
        if !self
            .kind
            .behavior()
            .applicable_attributes()
            .contains(key.flag())
        {
            return Err(AttributeError::NotApplicable {
                kind: self.kind,
                key,
            });
        }
        if value.value_type() != key.value_type() {
            return Err(AttributeError::TypeMismatch {
                key,
                expected: key.value_type(),
                actual: value.value_type(),
            });
        }
        Ok(())
    }

    /// Validated attribute write.
    ///
    /// A font size change on a tab container also recomputes its tab strip
    /// height, and tab counters are kept inside the tab list.
    pub fn set_attribute(&mut self, key: AttrKey, value: AttrValue) -> Result<(), AttributeError> {
        let value = value.clone().coerce(key).unwrap_or(value);
        self.check_attribute(key, &value)?;
        self.attributes.insert(key, value);
        if self.kind == ControlKind::TabContainer {
            match key {
                AttrKey::FontSize => {
                    let font_size = self
                        .attributes
                        .int(AttrKey::FontSize)
                        .unwrap_or(crate::kind::DEFAULT_FONT_SIZE);
                    self.attributes.insert(
                        AttrKey::TabBarHeight,
                        i64::from(tab_bar_height_for_font(font_size)),
                    );
                }
                AttrKey::TabTitles | AttrKey::CurrentTab => {
                    let current = self.current_tab().unwrap_or(0);
                    self.attributes.insert(AttrKey::CurrentTab, current as i64);
                }
                _ => {}
            }
        }
        Ok(())
    }
}
