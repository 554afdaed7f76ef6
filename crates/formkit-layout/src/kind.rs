//! Control kinds and their per-kind behaviour.
//!
//! Every question the designer asks about a kind (content area, default
//! size, applicable attributes, whether it can hold children) is answered by
//! one [`ControlBehavior`] implementation, looked up with
//! [`ControlKind::behavior`].

use std::fmt;

use formkit_core::geometry::{Rect, Sides, Size};
use serde::{Deserialize, Serialize};

use crate::attr::{AttrKey, AttrSet, Attributes};

/// Height of a titled container's title band.
pub const TITLE_BAND_HEIGHT: i32 = 15;

/// Font size (points) new controls start with.
pub const DEFAULT_FONT_SIZE: i64 = 9;

/// Tab bar height of a tab container using [`DEFAULT_FONT_SIZE`].
pub const DEFAULT_TAB_BAR_HEIGHT: i32 = 30;

/// Tab strip height for a font size in points.
///
/// Two text lines' worth of glyph height plus the strip's frame, which gives
/// 30 units for the default 9pt font.
#[must_use]
pub fn tab_bar_height_for_font(font_size: i64) -> i32 {
    let clamped = font_size.clamp(1, 512) as i32;
    clamped * 2 + 12
}

/// Closed set of control kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    Button,
    Label,
    TextInput,
    MultilineText,
    Checkbox,
    RadioButton,
    ComboBox,
    ListBox,
    Table,
    TabContainer,
    TitledContainer,
    Slider,
    ScrollContainer,
    PlainContainer,
    /// The synthetic window root. Never stored in the control tree.
    MainWindow,
}

impl ControlKind {
    /// Kinds that can be placed on the canvas.
    pub const PLACEABLE: [ControlKind; 14] = [
        Self::Button,
        Self::Label,
        Self::TextInput,
        Self::MultilineText,
        Self::Checkbox,
        Self::RadioButton,
        Self::ComboBox,
        Self::ListBox,
        Self::Table,
        Self::TabContainer,
        Self::TitledContainer,
        Self::Slider,
        Self::ScrollContainer,
        Self::PlainContainer,
    ];

    /// The behaviour table entry for this kind.
    #[must_use]
    pub fn behavior(self) -> &'static dyn ControlBehavior {
        match self {
            Self::Button => &Button,
            Self::Label => &Label,
            Self::TextInput => &TextInput,
            Self::MultilineText => &MultilineText,
            Self::Checkbox => &Checkbox,
            Self::RadioButton => &RadioButton,
            Self::ComboBox => &ComboBox,
            Self::ListBox => &ListBox,
            Self::Table => &Table,
            Self::TabContainer => &TabContainer,
            Self::TitledContainer => &TitledContainer,
            Self::Slider => &Slider,
            Self::ScrollContainer => &ScrollContainer,
            Self::PlainContainer => &PlainContainer,
            Self::MainWindow => &MainWindow,
        }
    }

    #[must_use]
    pub fn is_placeable(self) -> bool {
        self != Self::MainWindow
    }

    #[must_use]
    pub fn accepts_children(self) -> bool {
        self.behavior().accepts_children()
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        self.behavior().label()
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-kind behaviour.
pub trait ControlBehavior: Sync {
    fn kind(&self) -> ControlKind;

    /// Display prefix used for default control names.
    fn label(&self) -> &'static str;

    /// Widget class emitted by code generation.
    fn toolkit_class(&self) -> &'static str;

    fn default_size(&self) -> Size;

    /// Attribute keys this kind accepts.
    fn applicable_attributes(&self) -> AttrSet {
        AttrSet::COMMON
    }

    /// Whether children may be dropped, drawn, or reparented into it.
    fn accepts_children(&self) -> bool {
        false
    }

    /// Chrome reserved at the edges of the control before the content area.
    fn content_insets(&self, _attrs: &Attributes) -> Sides {
        Sides::default()
    }

    /// Area available to children, relative to the control's own origin.
    ///
    /// Never negative: a band taller than the control leaves a zero-height area.
    fn content_area(&self, outer: Size, attrs: &Attributes) -> Rect {
        Rect::from_size(outer).inner(self.content_insets(attrs))
    }

    /// Attributes a freshly created control starts with.
    fn default_attributes(&self) -> Attributes {
        common_defaults()
    }
}

/// Declares a unit struct implementing [`ControlBehavior`] for a leaf kind.
macro_rules! leaf_behavior {
    ($ty:ident, $label:literal, $class:literal, ($w:literal, $h:literal), $extra:expr, |$attrs:ident| $init:block) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $ty;

        impl ControlBehavior for $ty {
            fn kind(&self) -> ControlKind {
                ControlKind::$ty
            }

            fn label(&self) -> &'static str {
                $label
            }

            fn toolkit_class(&self) -> &'static str {
                $class
            }

            fn default_size(&self) -> Size {
                Size::new($w, $h)
            }

            fn applicable_attributes(&self) -> AttrSet {
                AttrSet::COMMON | $extra
            }

            fn default_attributes(&self) -> Attributes {
                let mut $attrs = common_defaults();
                $init
                $attrs
            }
        }
    };
}

fn common_defaults() -> Attributes {
    let mut attrs = Attributes::new();
    attrs.insert(AttrKey::Visible, true);
    attrs.insert(AttrKey::Enabled, true);
    attrs.insert(AttrKey::Locked, false);
    attrs.insert(AttrKey::FontSize, DEFAULT_FONT_SIZE);
    attrs
}

leaf_behavior!(Button, "Button", "QPushButton", (50, 30), AttrSet::TEXT, |attrs| {
    attrs.insert(AttrKey::Text, "Button");
});

leaf_behavior!(Label, "Label", "QLabel", (50, 30), AttrSet::TEXT, |attrs| {
    attrs.insert(AttrKey::Text, "Label");
});

leaf_behavior!(
    TextInput,
    "LineEdit",
    "QLineEdit",
    (150, 30),
    AttrSet::TEXT.union(AttrSet::PLACEHOLDER),
    |attrs| {
        attrs.insert(AttrKey::Placeholder, "");
    }
);

leaf_behavior!(
    Checkbox,
    "CheckBox",
    "QCheckBox",
    (100, 40),
    AttrSet::TEXT.union(AttrSet::CHECKED),
    |attrs| {
        attrs.insert(AttrKey::Text, "CheckBox");
        attrs.insert(AttrKey::Checked, false);
    }
);

leaf_behavior!(
    RadioButton,
    "RadioButton",
    "QRadioButton",
    (100, 40),
    AttrSet::TEXT.union(AttrSet::CHECKED),
    |attrs| {
        attrs.insert(AttrKey::Text, "RadioButton");
        attrs.insert(AttrKey::Checked, false);
    }
);

leaf_behavior!(ComboBox, "ComboBox", "QComboBox", (100, 40), AttrSet::ITEMS, |attrs| {
    attrs.insert(AttrKey::Items, Vec::<String>::new());
});

leaf_behavior!(
    Slider,
    "Slider",
    "QSlider",
    (100, 20),
    AttrSet::MINIMUM
        .union(AttrSet::MAXIMUM)
        .union(AttrSet::VALUE)
        .union(AttrSet::ORIENTATION),
    |attrs| {
        attrs.insert(AttrKey::Minimum, 0_i64);
        attrs.insert(AttrKey::Maximum, 100_i64);
        attrs.insert(AttrKey::Value, 0_i64);
        attrs.insert(AttrKey::Orientation, "horizontal");
    }
);

/// Text area. Accepts dropped children like the other scrollable views.
#[derive(Debug, Clone, Copy)]
pub struct MultilineText;

impl ControlBehavior for MultilineText {
    fn kind(&self) -> ControlKind {
        ControlKind::MultilineText
    }

    fn label(&self) -> &'static str {
        "TextEdit"
    }

    fn toolkit_class(&self) -> &'static str {
        "QTextEdit"
    }

    fn default_size(&self) -> Size {
        Size::new(150, 100)
    }

    fn applicable_attributes(&self) -> AttrSet {
        AttrSet::COMMON | AttrSet::TEXT | AttrSet::PLACEHOLDER
    }

    fn accepts_children(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ListBox;

impl ControlBehavior for ListBox {
    fn kind(&self) -> ControlKind {
        ControlKind::ListBox
    }

    fn label(&self) -> &'static str {
        "ListWidget"
    }

    fn toolkit_class(&self) -> &'static str {
        "QListWidget"
    }

    fn default_size(&self) -> Size {
        Size::new(150, 100)
    }

    fn applicable_attributes(&self) -> AttrSet {
        AttrSet::COMMON | AttrSet::ITEMS
    }

    fn accepts_children(&self) -> bool {
        true
    }

    fn default_attributes(&self) -> Attributes {
        let mut attrs = common_defaults();
        attrs.insert(AttrKey::Items, Vec::<String>::new());
        attrs
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Table;

impl ControlBehavior for Table {
    fn kind(&self) -> ControlKind {
        ControlKind::Table
    }

    fn label(&self) -> &'static str {
        "TableWidget"
    }

    fn toolkit_class(&self) -> &'static str {
        "QTableWidget"
    }

    fn default_size(&self) -> Size {
        Size::new(450, 70)
    }

    fn applicable_attributes(&self) -> AttrSet {
        AttrSet::COMMON | AttrSet::COLUMN_HEADERS | AttrSet::TABLE_DATA
    }

    fn accepts_children(&self) -> bool {
        true
    }

    fn default_attributes(&self) -> Attributes {
        let mut attrs = common_defaults();
        attrs.insert(
            AttrKey::ColumnHeaders,
            vec!["Column 1".to_string(), "Column 2".to_string()],
        );
        attrs.insert(AttrKey::TableData, Vec::<Vec<String>>::new());
        attrs
    }
}

/// Tabbed container. Its content area starts below the tab strip.
#[derive(Debug, Clone, Copy)]
pub struct TabContainer;

impl TabContainer {
    /// Tab strip height stored on the control, or derived from its font size.
    #[must_use]
    pub fn tab_bar_height(attrs: &Attributes) -> i32 {
        match attrs.int(AttrKey::TabBarHeight) {
            Some(height) => height.clamp(0, i64::from(i32::MAX)) as i32,
            None => {
                let font_size = attrs.int(AttrKey::FontSize).unwrap_or(DEFAULT_FONT_SIZE);
                tab_bar_height_for_font(font_size)
            }
        }
    }
}

impl ControlBehavior for TabContainer {
    fn kind(&self) -> ControlKind {
        ControlKind::TabContainer
    }

    fn label(&self) -> &'static str {
        "TabWidget"
    }

    fn toolkit_class(&self) -> &'static str {
        "QTabWidget"
    }

    fn default_size(&self) -> Size {
        Size::new(300, 200)
    }

    fn applicable_attributes(&self) -> AttrSet {
        AttrSet::COMMON | AttrSet::TAB_TITLES | AttrSet::CURRENT_TAB | AttrSet::TAB_BAR_HEIGHT
    }

    fn accepts_children(&self) -> bool {
        true
    }

    fn content_insets(&self, attrs: &Attributes) -> Sides {
        Sides::top(Self::tab_bar_height(attrs))
    }

    fn default_attributes(&self) -> Attributes {
        let mut attrs = common_defaults();
        attrs.insert(
            AttrKey::TabTitles,
            vec!["Tab 1".to_string(), "Tab 2".to_string()],
        );
        attrs.insert(AttrKey::CurrentTab, 0_i64);
        attrs.insert(
            AttrKey::TabBarHeight,
            i64::from(tab_bar_height_for_font(DEFAULT_FONT_SIZE)),
        );
        attrs
    }
}

/// Group box with a title band.
#[derive(Debug, Clone, Copy)]
pub struct TitledContainer;

impl ControlBehavior for TitledContainer {
    fn kind(&self) -> ControlKind {
        ControlKind::TitledContainer
    }

    fn label(&self) -> &'static str {
        "GroupBox"
    }

    fn toolkit_class(&self) -> &'static str {
        "QGroupBox"
    }

    fn default_size(&self) -> Size {
        Size::new(200, 150)
    }

    fn applicable_attributes(&self) -> AttrSet {
        AttrSet::COMMON | AttrSet::TITLE
    }

    fn accepts_children(&self) -> bool {
        true
    }

    fn content_insets(&self, _attrs: &Attributes) -> Sides {
        Sides::top(TITLE_BAND_HEIGHT)
    }

    fn default_attributes(&self) -> Attributes {
        let mut attrs = common_defaults();
        attrs.insert(AttrKey::Title, "GroupBox");
        attrs
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScrollContainer;

impl ControlBehavior for ScrollContainer {
    fn kind(&self) -> ControlKind {
        ControlKind::ScrollContainer
    }

    fn label(&self) -> &'static str {
        "ScrollArea"
    }

    fn toolkit_class(&self) -> &'static str {
        "QScrollArea"
    }

    fn default_size(&self) -> Size {
        Size::new(200, 150)
    }

    fn accepts_children(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PlainContainer;

impl ControlBehavior for PlainContainer {
    fn kind(&self) -> ControlKind {
        ControlKind::PlainContainer
    }

    fn label(&self) -> &'static str {
        "Frame"
    }

    fn toolkit_class(&self) -> &'static str {
        "QFrame"
    }

    fn default_size(&self) -> Size {
        Size::new(200, 150)
    }

    fn accepts_children(&self) -> bool {
        true
    }
}

/// Behaviour entry for the window root.
///
/// The root's geometry lives on [`crate::frame::MainWindowFrame`]; this
/// entry exists so kind-driven lookups stay total.
#[derive(Debug, Clone, Copy)]
pub struct MainWindow;

impl ControlBehavior for MainWindow {
    fn kind(&self) -> ControlKind {
        ControlKind::MainWindow
    }

    fn label(&self) -> &'static str {
        "MainWindow"
    }

    fn toolkit_class(&self) -> &'static str {
        "QMainWindow"
    }

    fn default_size(&self) -> Size {
        Size::new(800, 600)
    }

    fn applicable_attributes(&self) -> AttrSet {
        AttrSet::empty()
    }

    fn accepts_children(&self) -> bool {
        true
    }

    fn default_attributes(&self) -> Attributes {
        Attributes::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_area_policy_table() {
        let outer = Size::new(300, 200);

        let tab = ControlKind::TabContainer.behavior();
        let attrs = tab.default_attributes();
        assert_eq!(tab.content_area(outer, &attrs), Rect::new(0, 30, 300, 170));

        let titled = ControlKind::TitledContainer.behavior();
        assert_eq!(
            titled.content_area(outer, &Attributes::new()),
            Rect::new(0, 15, 300, 185)
        );

        for kind in [
            ControlKind::ScrollContainer,
            ControlKind::PlainContainer,
            ControlKind::Button,
            ControlKind::Table,
        ] {
            assert_eq!(
                kind.behavior().content_area(outer, &Attributes::new()),
                Rect::new(0, 0, 300, 200),
                "{kind}"
            );
        }
    }

    #[test]
    fn band_taller_than_control_gives_zero_height() {
        let titled = ControlKind::TitledContainer.behavior();
        let area = titled.content_area(Size::new(50, 10), &Attributes::new());
        assert_eq!(area.height, 0);
        assert_eq!(area.width, 50);
    }

    #[test]
    fn tab_bar_height_follows_font() {
        assert_eq!(tab_bar_height_for_font(DEFAULT_FONT_SIZE), DEFAULT_TAB_BAR_HEIGHT);
        assert_eq!(tab_bar_height_for_font(12), 36);

        let mut attrs = Attributes::new();
        attrs.insert(AttrKey::FontSize, 14_i64);
        assert_eq!(TabContainer::tab_bar_height(&attrs), 40);
        attrs.insert(AttrKey::TabBarHeight, 25_i64);
        assert_eq!(TabContainer::tab_bar_height(&attrs), 25);
    }

    #[test]
    fn behaviors_report_their_own_kind() {
        for kind in ControlKind::PLACEABLE {
            assert_eq!(kind.behavior().kind(), kind);
            let defaults = kind.behavior().default_attributes();
            let applicable = kind.behavior().applicable_attributes();
            for (key, value) in defaults.iter() {
                assert!(applicable.contains(key.flag()), "{kind}: {key}");
                assert_eq!(value.value_type(), key.value_type(), "{kind}: {key}");
            }
        }
        assert_eq!(ControlKind::MainWindow.behavior().kind(), ControlKind::MainWindow);
    }

    #[test]
    fn container_set_matches_drop_targets() {
        let containers: Vec<_> = ControlKind::PLACEABLE
            .into_iter()
            .filter(|kind| kind.accepts_children())
            .collect();
        assert_eq!(
            containers,
            vec![
                ControlKind::MultilineText,
                ControlKind::ListBox,
                ControlKind::Table,
                ControlKind::TabContainer,
                ControlKind::TitledContainer,
                ControlKind::ScrollContainer,
                ControlKind::PlainContainer,
            ]
        );
    }

    #[test]
    fn default_sizes() {
        assert_eq!(ControlKind::Button.behavior().default_size(), Size::new(50, 30));
        assert_eq!(ControlKind::TextInput.behavior().default_size(), Size::new(150, 30));
        assert_eq!(ControlKind::Table.behavior().default_size(), Size::new(450, 70));
        assert_eq!(ControlKind::Slider.behavior().default_size(), Size::new(100, 20));
        assert_eq!(ControlKind::Checkbox.behavior().default_size(), Size::new(100, 40));
    }
}
