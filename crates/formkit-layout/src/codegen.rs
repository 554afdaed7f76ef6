//! PyQt5 source generation.
//!
//! Emits a single module with a `Ui_MainWindow.setupUi` class, a
//! `MainWindow` subclass that connects event bindings to stub handlers, and a
//! `__main__` block. Widgets are written depth-first in sibling order.
//!
//! Geometry is relative to the toolkit parent: tab-page children use their
//! local rectangle (a page is the content area), children of other
//! containers add the container's content offset, and root children are
//! relative to the central widget.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::attr::{AttrKey, Attributes};
use crate::control::{Control, ControlId, ParentRef};
use crate::frame::MainWindowFrame;
use crate::kind::{ControlKind, DEFAULT_FONT_SIZE};
use crate::tree::ControlTree;

const INDENT: &str = "    ";

const PY_KEYWORDS: [&str; 35] = [
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// Generate PyQt5 source for a design.
#[must_use]
pub fn generate_python(tree: &ControlTree, frame: &MainWindowFrame) -> String {
    let names = assign_identifiers(tree);
    let mut out = Emitter {
        tree,
        names: &names,
        buf: String::new(),
    };

    out.buf.push_str(HEADER);
    out.line(0, "class Ui_MainWindow(object):");
    out.line(1, "def setupUi(self, MainWindow):");
    out.line(2, &format!("MainWindow.setObjectName({})", py_str(&frame.name)));
    out.line(
        2,
        &format!("MainWindow.resize({}, {})", frame.width.max(0), frame.height.max(0)),
    );
    out.line(2, &format!("MainWindow.setWindowTitle({})", py_str(&frame.title)));
    out.line(
        2,
        &format!(
            "MainWindow.setStyleSheet({})",
            py_str(&format!("background-color: {};", frame.background_color))
        ),
    );
    out.line(2, "self.centralwidget = QWidget(MainWindow)");
    out.line(2, "self.centralwidget.setObjectName(\"centralwidget\")");
    out.line(2, "MainWindow.setCentralWidget(self.centralwidget)");
    for child in tree.children_of(ParentRef::Root) {
        out.widget(*child, "self.centralwidget", (0, 0));
    }

    out.buf.push('\n');
    out.bindings();
    out.buf.push_str(FOOTER);

    formkit_core::debug!(
        message = "codegen.generated",
        controls = tree.len(),
        bytes = out.buf.len()
    );
    out.buf
}

const HEADER: &str = "\
#!/usr/bin/env python3
# -*- coding: utf-8 -*-
\"\"\"Generated by formkit. Edits will be lost on regeneration.\"\"\"
import sys

from PyQt5.QtCore import QRect, Qt
from PyQt5.QtGui import QFont
from PyQt5.QtWidgets import (QApplication, QCheckBox, QComboBox, QFrame,
                             QGroupBox, QLabel, QLineEdit, QListWidget,
                             QMainWindow, QPushButton, QRadioButton,
                             QScrollArea, QSlider, QTableWidget,
                             QTableWidgetItem, QTabWidget, QTextEdit, QWidget)


";

const FOOTER: &str = "

if __name__ == \"__main__\":
    app = QApplication(sys.argv)
    window = MainWindow()
    window.show()
    sys.exit(app.exec_())
";

struct Emitter<'a> {
    tree: &'a ControlTree,
    names: &'a FxHashMap<ControlId, String>,
    buf: String,
}

impl Emitter<'_> {
    fn line(&mut self, depth: usize, text: &str) {
        for _ in 0..depth {
            self.buf.push_str(INDENT);
        }
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    fn var(&self, id: ControlId) -> String {
        match self.names.get(&id) {
            Some(name) => format!("self.{name}"),
            None => format!("self.control_{}", id.get()),
        }
    }

    /// Emit one control and its subtree. `offset` is the parent's content
    /// offset inside its own toolkit widget.
    fn widget(&mut self, id: ControlId, parent_var: &str, offset: (i32, i32)) {
        let tree = self.tree;
        let Some(node) = tree.get(id) else {
            return;
        };
        let var = self.var(id);
        let class = node.kind().behavior().toolkit_class();
        let rect = node.local_rect.translate(offset.0, offset.1);

        self.line(2, &format!("{var} = {class}({parent_var})"));
        self.line(2, &format!("{var}.setObjectName({})", py_str(&node.name)));
        self.line(
            2,
            &format!(
                "{var}.setGeometry(QRect({}, {}, {}, {}))",
                rect.x, rect.y, rect.width, rect.height
            ),
        );
        self.content(&var, node);
        self.appearance(&var, &node.attributes);

        match node.kind() {
            ControlKind::TabContainer => self.tab_pages(&var, node),
            ControlKind::ScrollContainer => {
                let content_var = format!("{var}_Content");
                self.line(2, &format!("{var}.setWidgetResizable(True)"));
                self.line(2, &format!("{content_var} = QWidget()"));
                self.line(
                    2,
                    &format!("{content_var}.setObjectName({})", py_str(&content_var[5..])),
                );
                self.line(2, &format!("{var}.setWidget({content_var})"));
                for child in node.children() {
                    self.widget(*child, &content_var, (0, 0));
                }
            }
            _ => {
                let inset = node.content_area();
                for child in node.children() {
                    self.widget(*child, &var, (inset.x, inset.y));
                }
            }
        }
    }

    fn tab_pages(&mut self, var: &str, node: &Control) {
        let count = node.tab_count();
        for (index, title) in node.tab_titles().iter().enumerate() {
            let page_var = format!("{var}_Page{}", index + 1);
            self.line(2, &format!("{page_var} = QWidget()"));
            self.line(
                2,
                &format!("{page_var}.setObjectName({})", py_str(&page_var[5..])),
            );
            self.line(2, &format!("{var}.addTab({page_var}, {})", py_str(title)));
            for child in node.children() {
                let page = self
                    .tree
                    .get(*child)
                    .and_then(|c| c.tab_page)
                    .filter(|page| *page < count)
                    .unwrap_or(0);
                if page == index {
                    self.widget(*child, &page_var, (0, 0));
                }
            }
        }
        if let Some(current) = node.current_tab() {
            self.line(2, &format!("{var}.setCurrentIndex({current})"));
        }
    }

    /// Kind-specific content attributes.
    fn content(&mut self, var: &str, node: &Control) {
        let attrs = &node.attributes;
        match node.kind() {
            ControlKind::Button
            | ControlKind::Label
            | ControlKind::TextInput
            | ControlKind::Checkbox
            | ControlKind::RadioButton => {
                if let Some(text) = attrs.text(AttrKey::Text) {
                    self.line(2, &format!("{var}.setText({})", py_str(text)));
                }
            }
            ControlKind::MultilineText => {
                if let Some(text) = attrs.text(AttrKey::Text).filter(|t| !t.is_empty()) {
                    self.line(2, &format!("{var}.setPlainText({})", py_str(text)));
                }
            }
            ControlKind::TitledContainer => {
                if let Some(title) = attrs.text(AttrKey::Title) {
                    self.line(2, &format!("{var}.setTitle({})", py_str(title)));
                }
            }
            ControlKind::ComboBox | ControlKind::ListBox => {
                let items = attrs.list(AttrKey::Items);
                if !items.is_empty() {
                    self.line(2, &format!("{var}.addItems({})", py_list(items)));
                }
            }
            ControlKind::Table => {
                let headers = attrs.list(AttrKey::ColumnHeaders);
                let data = attrs.grid(AttrKey::TableData);
                let columns = data
                    .iter()
                    .map(Vec::len)
                    .max()
                    .unwrap_or(0)
                    .max(headers.len());
                self.line(2, &format!("{var}.setColumnCount({columns})"));
                self.line(2, &format!("{var}.setRowCount({})", data.len()));
                if !headers.is_empty() {
                    self.line(
                        2,
                        &format!("{var}.setHorizontalHeaderLabels({})", py_list(headers)),
                    );
                }
                for (row, cells) in data.iter().enumerate() {
                    for (column, cell) in cells.iter().enumerate() {
                        self.line(
                            2,
                            &format!(
                                "{var}.setItem({row}, {column}, QTableWidgetItem({}))",
                                py_str(cell)
                            ),
                        );
                    }
                }
            }
            ControlKind::Slider => {
                let orientation = match attrs.text(AttrKey::Orientation) {
                    Some("vertical") => "Qt.Vertical",
                    _ => "Qt.Horizontal",
                };
                self.line(2, &format!("{var}.setOrientation({orientation})"));
                for (key, setter) in [
                    (AttrKey::Minimum, "setMinimum"),
                    (AttrKey::Maximum, "setMaximum"),
                    (AttrKey::Value, "setValue"),
                ] {
                    if let Some(value) = attrs.int(key) {
                        self.line(2, &format!("{var}.{setter}({value})"));
                    }
                }
            }
            _ => {}
        }
        if let Some(placeholder) = attrs.text(AttrKey::Placeholder).filter(|t| !t.is_empty()) {
            self.line(2, &format!("{var}.setPlaceholderText({})", py_str(placeholder)));
        }
        if attrs.bool_or(AttrKey::Checked, false) {
            self.line(2, &format!("{var}.setChecked(True)"));
        }
    }

    /// Font, tooltip, style sheet, and the enabled/visible flags.
    fn appearance(&mut self, var: &str, attrs: &Attributes) {
        let family = attrs.text(AttrKey::FontFamily).filter(|f| !f.is_empty());
        let size = attrs.int(AttrKey::FontSize).filter(|s| *s != DEFAULT_FONT_SIZE);
        let bold = attrs.bool_or(AttrKey::Bold, false);
        if family.is_some() || size.is_some() || bold {
            self.line(2, "font = QFont()");
            if let Some(family) = family {
                self.line(2, &format!("font.setFamily({})", py_str(family)));
            }
            if let Some(size) = size {
                self.line(2, &format!("font.setPointSize({size})"));
            }
            if bold {
                self.line(2, "font.setBold(True)");
            }
            self.line(2, &format!("{var}.setFont(font)"));
        }

        if let Some(tip) = attrs.text(AttrKey::ToolTip).filter(|t| !t.is_empty()) {
            self.line(2, &format!("{var}.setToolTip({})", py_str(tip)));
        }

        let style = style_sheet(attrs);
        if !style.is_empty() {
            self.line(2, &format!("{var}.setStyleSheet({})", py_str(&style)));
        }

        if !attrs.bool_or(AttrKey::Enabled, true) {
            self.line(2, &format!("{var}.setEnabled(False)"));
        }
        if !attrs.bool_or(AttrKey::Visible, true) {
            self.line(2, &format!("{var}.setVisible(False)"));
        }
    }

    /// The `MainWindow` class: connections plus one stub per callback.
    fn bindings(&mut self) {
        self.line(0, "class MainWindow(QMainWindow, Ui_MainWindow):");
        self.line(1, "def __init__(self):");
        self.line(2, "super().__init__()");
        self.line(2, "self.setupUi(self)");
        self.line(2, "self.bind_events()");
        self.buf.push('\n');
        self.line(1, "def bind_events(self):");

        let mut handlers: Vec<String> = Vec::new();
        let mut seen = FxHashSet::default();
        let mut connected = 0_usize;
        let tree = self.tree;
        for node in tree.iter() {
            let var = self.var(node.id());
            for binding in &node.events {
                let event = sanitize_identifier(binding.event.trim());
                let handler = callback_name(&binding.callback);
                let (Some(event), Some(handler)) = (event, handler) else {
                    continue;
                };
                self.line(2, &format!("{var}.{event}.connect(self.{handler})"));
                connected += 1;
                if seen.insert(handler.clone()) {
                    handlers.push(handler);
                }
            }
        }
        if connected == 0 {
            self.line(2, "pass");
        }

        for handler in handlers {
            self.buf.push('\n');
            self.line(1, &format!("def {handler}(self):"));
            self.line(2, &format!("print({})", py_str(&format!("{handler} triggered"))));
        }
    }
}

/// Style sheet from an explicit attribute, or composed from colour and
/// border attributes.
fn style_sheet(attrs: &Attributes) -> String {
    if let Some(explicit) = attrs.text(AttrKey::StyleSheet).filter(|s| !s.trim().is_empty()) {
        return explicit.replace('\n', " ");
    }
    let mut parts = Vec::new();
    if let Some(color) = attrs.text(AttrKey::ForegroundColor).filter(|c| !c.is_empty()) {
        parts.push(format!("color: {color};"));
    }
    if let Some(color) = attrs.text(AttrKey::BackgroundColor).filter(|c| !c.is_empty()) {
        parts.push(format!("background-color: {color};"));
    }
    if let Some(width) = attrs.int(AttrKey::BorderWidth).filter(|w| *w > 0) {
        let color = attrs.text(AttrKey::BorderColor).unwrap_or("#000000");
        parts.push(format!("border: {width}px solid {color};"));
    }
    if let Some(radius) = attrs.int(AttrKey::BorderRadius).filter(|r| *r > 0) {
        parts.push(format!("border-radius: {radius}px;"));
    }
    parts.join(" ")
}

/// Unique Python identifiers for every control, in paint order.
fn assign_identifiers(tree: &ControlTree) -> FxHashMap<ControlId, String> {
    let mut taken: FxHashSet<String> = ["centralwidget".to_string()].into_iter().collect();
    let mut names = FxHashMap::default();
    for node in tree.iter() {
        let base = sanitize_identifier(&node.name)
            .unwrap_or_else(|| format!("{}_{}", node.kind().label(), node.id().get()));
        let mut candidate = base.clone();
        let mut n = 2_usize;
        while taken.contains(&candidate) {
            candidate = format!("{base}_{n}");
            n += 1;
        }
        taken.insert(candidate.clone());
        names.insert(node.id(), candidate);
    }
    names
}

/// Map arbitrary text onto a Python identifier; `None` if nothing usable
/// remains.
fn sanitize_identifier(raw: &str) -> Option<String> {
    let mut out: String = raw
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.trim_matches('_').is_empty() {
        return None;
    }
    if out.starts_with(|c: char| c.is_numeric()) {
        out.insert(0, '_');
    }
    if PY_KEYWORDS.contains(&out.as_str()) {
        out.push('_');
    }
    Some(out)
}

/// Handler method name from a callback such as `on_ok`, `self.on_ok` or
/// `on_ok()`.
fn callback_name(callback: &str) -> Option<String> {
    let head = callback.split('(').next().unwrap_or(callback).trim();
    let head = head.strip_prefix("self.").unwrap_or(head);
    sanitize_identifier(head)
}

/// Double-quoted Python string literal.
fn py_str(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn py_list(items: &[String]) -> String {
    let inner: Vec<String> = items.iter().map(|item| py_str(item)).collect();
    format!("[{}]", inner.join(", "))
}
