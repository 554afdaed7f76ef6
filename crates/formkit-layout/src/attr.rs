//! Typed presentation attributes carried by controls.
//!
//! The geometry core reads only a handful of keys (visibility, lock state,
//! tab titles, current tab, tab bar height, font size). Everything else is
//! stored, persisted, and handed to code generation untouched.

use std::collections::BTreeMap;
use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::kind::ControlKind;

bitflags! {
    /// Set of attribute keys applicable to a control kind.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct AttrSet: u32 {
        const VISIBLE          = 1 << 0;
        const ENABLED          = 1 << 1;
        const LOCKED           = 1 << 2;
        const TEXT             = 1 << 3;
        const TOOL_TIP         = 1 << 4;
        const FONT_FAMILY      = 1 << 5;
        const FONT_SIZE        = 1 << 6;
        const BOLD             = 1 << 7;
        const FOREGROUND_COLOR = 1 << 8;
        const BACKGROUND_COLOR = 1 << 9;
        const BORDER_COLOR     = 1 << 10;
        const BORDER_WIDTH     = 1 << 11;
        const BORDER_RADIUS    = 1 << 12;
        const PLACEHOLDER      = 1 << 13;
        const CHECKED          = 1 << 14;
        const ITEMS            = 1 << 15;
        const COLUMN_HEADERS   = 1 << 16;
        const TABLE_DATA       = 1 << 17;
        const TAB_TITLES       = 1 << 18;
        const CURRENT_TAB      = 1 << 19;
        const TAB_BAR_HEIGHT   = 1 << 20;
        const MINIMUM          = 1 << 21;
        const MAXIMUM          = 1 << 22;
        const VALUE            = 1 << 23;
        const ORIENTATION      = 1 << 24;
        const TITLE            = 1 << 25;
        const STYLE_SHEET      = 1 << 26;

        /// Keys every control kind carries.
        const COMMON = Self::VISIBLE.bits()
            | Self::ENABLED.bits()
            | Self::LOCKED.bits()
            | Self::TOOL_TIP.bits()
            | Self::FONT_FAMILY.bits()
            | Self::FONT_SIZE.bits()
            | Self::BOLD.bits()
            | Self::FOREGROUND_COLOR.bits()
            | Self::BACKGROUND_COLOR.bits()
            | Self::BORDER_COLOR.bits()
            | Self::BORDER_WIDTH.bits()
            | Self::BORDER_RADIUS.bits()
            | Self::STYLE_SHEET.bits();
    }
}

/// Attribute keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrKey {
    Visible,
    Enabled,
    Locked,
    Text,
    ToolTip,
    FontFamily,
    FontSize,
    Bold,
    ForegroundColor,
    BackgroundColor,
    BorderColor,
    BorderWidth,
    BorderRadius,
    Placeholder,
    Checked,
    Items,
    ColumnHeaders,
    TableData,
    TabTitles,
    CurrentTab,
    TabBarHeight,
    Minimum,
    Maximum,
    Value,
    Orientation,
    Title,
    StyleSheet,
}

impl AttrKey {
    pub const ALL: [AttrKey; 27] = [
        Self::Visible,
        Self::Enabled,
        Self::Locked,
        Self::Text,
        Self::ToolTip,
        Self::FontFamily,
        Self::FontSize,
        Self::Bold,
        Self::ForegroundColor,
        Self::BackgroundColor,
        Self::BorderColor,
        Self::BorderWidth,
        Self::BorderRadius,
        Self::Placeholder,
        Self::Checked,
        Self::Items,
        Self::ColumnHeaders,
        Self::TableData,
        Self::TabTitles,
        Self::CurrentTab,
        Self::TabBarHeight,
        Self::Minimum,
        Self::Maximum,
        Self::Value,
        Self::Orientation,
        Self::Title,
        Self::StyleSheet,
    ];

    /// The bit for this key inside an [`AttrSet`].
    #[must_use]
    pub const fn flag(self) -> AttrSet {
        match self {
            Self::Visible => AttrSet::VISIBLE,
            Self::Enabled => AttrSet::ENABLED,
            Self::Locked => AttrSet::LOCKED,
            Self::Text => AttrSet::TEXT,
            Self::ToolTip => AttrSet::TOOL_TIP,
            Self::FontFamily => AttrSet::FONT_FAMILY,
            Self::FontSize => AttrSet::FONT_SIZE,
            Self::Bold => AttrSet::BOLD,
            Self::ForegroundColor => AttrSet::FOREGROUND_COLOR,
            Self::BackgroundColor => AttrSet::BACKGROUND_COLOR,
            Self::BorderColor => AttrSet::BORDER_COLOR,
            Self::BorderWidth => AttrSet::BORDER_WIDTH,
            Self::BorderRadius => AttrSet::BORDER_RADIUS,
            Self::Placeholder => AttrSet::PLACEHOLDER,
            Self::Checked => AttrSet::CHECKED,
            Self::Items => AttrSet::ITEMS,
            Self::ColumnHeaders => AttrSet::COLUMN_HEADERS,
            Self::TableData => AttrSet::TABLE_DATA,
            Self::TabTitles => AttrSet::TAB_TITLES,
            Self::CurrentTab => AttrSet::CURRENT_TAB,
            Self::TabBarHeight => AttrSet::TAB_BAR_HEIGHT,
            Self::Minimum => AttrSet::MINIMUM,
            Self::Maximum => AttrSet::MAXIMUM,
            Self::Value => AttrSet::VALUE,
            Self::Orientation => AttrSet::ORIENTATION,
            Self::Title => AttrSet::TITLE,
            Self::StyleSheet => AttrSet::STYLE_SHEET,
        }
    }

    /// The value type this key stores.
    #[must_use]
    pub const fn value_type(self) -> AttrType {
        match self {
            Self::Visible | Self::Enabled | Self::Locked | Self::Bold | Self::Checked => {
                AttrType::Bool
            }
            Self::FontSize
            | Self::BorderWidth
            | Self::BorderRadius
            | Self::CurrentTab
            | Self::TabBarHeight
            | Self::Minimum
            | Self::Maximum
            | Self::Value => AttrType::Int,
            Self::Items | Self::ColumnHeaders | Self::TabTitles => AttrType::List,
            Self::TableData => AttrType::Grid,
            Self::Text
            | Self::ToolTip
            | Self::FontFamily
            | Self::ForegroundColor
            | Self::BackgroundColor
            | Self::BorderColor
            | Self::Placeholder
            | Self::Orientation
            | Self::Title
            | Self::StyleSheet => AttrType::Text,
        }
    }

    /// Keys contained in `set`, in declaration order.
    pub fn iter_set(set: AttrSet) -> impl Iterator<Item = AttrKey> {
        Self::ALL.into_iter().filter(move |key| set.contains(key.flag()))
    }
}

impl fmt::Display for AttrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Shape of an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrType {
    Bool,
    Int,
    Text,
    List,
    Grid,
}

/// An attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Text(String),
    List(Vec<String>),
    Grid(Vec<Vec<String>>),
}

impl AttrValue {
    #[must_use]
    pub const fn value_type(&self) -> AttrType {
        match self {
            Self::Bool(_) => AttrType::Bool,
            Self::Int(_) => AttrType::Int,
            Self::Text(_) => AttrType::Text,
            Self::List(_) => AttrType::List,
            Self::Grid(_) => AttrType::Grid,
        }
    }

    /// Reinterpret a decoded value for `key`.
    ///
    /// Untagged decoding cannot tell an empty list from an empty grid, so an
    /// empty `List` is accepted where a `Grid` is expected.
    #[must_use]
    pub fn coerce(self, key: AttrKey) -> Option<AttrValue> {
        match (key.value_type(), self) {
            (AttrType::Grid, AttrValue::List(items)) if items.is_empty() => {
                Some(AttrValue::Grid(Vec::new()))
            }
            (expected, value) if value.value_type() == expected => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_grid(&self) -> Option<&[Vec<String>]> {
        match self {
            Self::Grid(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<Vec<Vec<String>>> for AttrValue {
    fn from(value: Vec<Vec<String>>) -> Self {
        Self::Grid(value)
    }
}

/// Attribute bag of one control.
///
/// Keys are kept sorted so serialized output is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<AttrKey, AttrValue>);

impl Attributes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: AttrKey) -> Option<&AttrValue> {
        self.0.get(&key)
    }

    /// Store a value without applicability checks; callers validate.
    pub fn insert(&mut self, key: AttrKey, value: impl Into<AttrValue>) -> Option<AttrValue> {
        self.0.insert(key, value.into())
    }

    pub fn remove(&mut self, key: AttrKey) -> Option<AttrValue> {
        self.0.remove(&key)
    }

    #[must_use]
    pub fn contains(&self, key: AttrKey) -> bool {
        self.0.contains_key(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AttrKey, &AttrValue)> {
        self.0.iter().map(|(key, value)| (*key, value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn bool_or(&self, key: AttrKey, default: bool) -> bool {
        self.get(key).and_then(AttrValue::as_bool).unwrap_or(default)
    }

    #[must_use]
    pub fn int(&self, key: AttrKey) -> Option<i64> {
        self.get(key).and_then(AttrValue::as_int)
    }

    #[must_use]
    pub fn text(&self, key: AttrKey) -> Option<&str> {
        self.get(key).and_then(AttrValue::as_text)
    }

    #[must_use]
    pub fn list(&self, key: AttrKey) -> &[String] {
        self.get(key).and_then(AttrValue::as_list).unwrap_or(&[])
    }

    #[must_use]
    pub fn grid(&self, key: AttrKey) -> &[Vec<String>] {
        self.get(key).and_then(AttrValue::as_grid).unwrap_or(&[])
    }
}

/// Rejected attribute writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeError {
    NotApplicable {
        kind: ControlKind,
        key: AttrKey,
    },
    TypeMismatch {
        key: AttrKey,
        expected: AttrType,
        actual: AttrType,
    },
}

impl fmt::Display for AttributeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotApplicable { kind, key } => {
                write!(f, "attribute {key} does not apply to {kind}")
            }
            Self::TypeMismatch {
                key,
                expected,
                actual,
            } => write!(
                f,
                "attribute {key} expects {expected:?}, got {actual:?}"
            ),
        }
    }
}

impl std::error::Error for AttributeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_key_has_a_distinct_flag() {
        let mut seen = AttrSet::empty();
        for key in AttrKey::ALL {
            assert!(!seen.contains(key.flag()), "{key} reuses a flag");
            seen |= key.flag();
        }
        assert_eq!(AttrKey::iter_set(seen).count(), AttrKey::ALL.len());
    }

    #[test]
    fn common_set_covers_visibility_and_lock() {
        assert!(AttrSet::COMMON.contains(AttrSet::VISIBLE | AttrSet::LOCKED));
        assert!(!AttrSet::COMMON.contains(AttrSet::TAB_TITLES));
    }

    #[test]
    fn empty_list_coerces_to_grid() {
        let value = AttrValue::List(Vec::new());
        assert_eq!(
            value.coerce(AttrKey::TableData),
            Some(AttrValue::Grid(Vec::new()))
        );
        assert_eq!(
            AttrValue::List(vec!["a".into()]).coerce(AttrKey::TableData),
            None
        );
        assert_eq!(AttrValue::Int(3).coerce(AttrKey::Text), None);
    }

    #[test]
    fn serializes_as_sorted_snake_case_map() {
        let mut attrs = Attributes::new();
        attrs.insert(AttrKey::Visible, true);
        attrs.insert(AttrKey::Text, "OK");
        attrs.insert(AttrKey::TabTitles, vec!["A".to_string()]);
        let json = serde_json::to_string(&attrs).expect("serialize");
        assert_eq!(json, r#"{"visible":true,"text":"OK","tab_titles":["A"]}"#);
        let back: Attributes = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, attrs);
    }

    #[test]
    fn typed_accessors_fall_back() {
        let attrs = Attributes::new();
        assert!(attrs.bool_or(AttrKey::Visible, true));
        assert!(attrs.list(AttrKey::Items).is_empty());
        assert_eq!(attrs.int(AttrKey::CurrentTab), None);
    }
}
