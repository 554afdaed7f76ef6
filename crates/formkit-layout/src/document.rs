//! Design documents: capture, restore, and the on-disk format.
//!
//! A document is a version tag, the window root as a flat object, and a list
//! of control records in paint order. Records link to their parent by id and
//! may appear before their parent; restoring runs in two passes (register,
//! then link) followed by a normalization pass.
//!
//! Two envelopes are supported: plain pretty-printed JSON and a packed form
//! (magic header plus a repeating-key XOR) that keeps casual edits out.
//! Loading never fails on malformed content: undecodable or malformed input
//! falls back to an empty document and reports why, and individual bad
//! records are skipped. Only I/O failures are errors.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::Path;

use formkit_core::geometry::Rect;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attr::{AttrKey, AttrValue};
use crate::control::{Control, ControlId, EventBinding, ParentRef};
use crate::frame::MainWindowFrame;
use crate::kind::{ControlKind, TabContainer};
use crate::tree::{ControlTree, LinkRepair, TreeError};

/// Current document format version.
pub const DOCUMENT_VERSION: &str = "1.0";

/// Header that marks a packed document.
pub const PACK_MAGIC: &[u8] = b"FORMKIT-PACK\x01\n";

/// File extension that selects the packed envelope when saving.
pub const PACK_EXTENSION: &str = "fkpack";

const PACK_KEY: &[u8] = b"formkit::layout";

/// Serialized design.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignDocument {
    pub version: String,
    pub main_window: MainWindowFrame,
    pub controls: Vec<ControlRecord>,
}

impl Default for DesignDocument {
    fn default() -> Self {
        Self {
            version: DOCUMENT_VERSION.to_string(),
            main_window: MainWindowFrame::default(),
            controls: Vec::new(),
        }
    }
}

/// One control as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlRecord {
    pub id: ControlId,
    pub kind: ControlKind,
    pub name: String,
    /// Local rectangle as `[x, y, width, height]`.
    pub rect: [i32; 4],
    /// Attribute map keyed by snake_case attribute name.
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    /// `[event, callback]` pairs.
    #[serde(default)]
    pub events: Vec<(String, String)>,
    /// `null` (or an unknown id) attaches the control to the window root.
    #[serde(default)]
    pub parent_id: Option<ControlId>,
    /// Page of a tab container parent; negative values mean none.
    #[serde(default)]
    pub parent_tab_page_index: Option<i64>,
}

impl ControlRecord {
    #[must_use]
    pub fn from_control(control: &Control) -> Self {
        let rect = control.local_rect;
        let attributes = control
            .attributes
            .iter()
            .filter_map(|(key, value)| {
                let name = serde_json::to_value(key).ok()?.as_str()?.to_string();
                Some((name, serde_json::to_value(value).ok()?))
            })
            .collect();
        Self {
            id: control.id(),
            kind: control.kind(),
            name: control.name.clone(),
            rect: [rect.x, rect.y, rect.width, rect.height],
            attributes,
            events: control
                .events
                .iter()
                .map(|binding| (binding.event.clone(), binding.callback.clone()))
                .collect(),
            parent_id: control.parent().control(),
            parent_tab_page_index: control.tab_page.map(|page| page as i64),
        }
    }

    /// Rebuild an unlinked control; unknown or inapplicable attributes are
    /// dropped and counted.
    fn to_control(&self) -> (Control, usize) {
        let [x, y, width, height] = self.rect;
        let mut control = Control::new(
            self.id,
            self.kind,
            self.name.clone(),
            Rect::new(x, y, width.max(0), height.max(0)),
        );
        let mut dropped = 0;
        for (name, raw) in &self.attributes {
            let key = serde_json::from_value::<AttrKey>(Value::String(name.clone()));
            let value = serde_json::from_value::<AttrValue>(raw.clone());
            let applied = match (key, value) {
                (Ok(key), Ok(value)) => control.set_attribute(key, value).is_ok(),
                _ => false,
            };
            if !applied {
                dropped += 1;
            }
        }
        control.events = self
            .events
            .iter()
            .map(|(event, callback)| EventBinding::new(event.clone(), callback.clone()))
            .collect();
        control.tab_page = self
            .parent_tab_page_index
            .and_then(|index| usize::try_from(index).ok());
        (control, dropped)
    }
}

/// Result of rebuilding a tree from a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoredDesign {
    pub tree: ControlTree,
    pub frame: MainWindowFrame,
    /// Parent links that were redirected to the root.
    pub repairs: Vec<LinkRepair>,
    /// Attribute entries that were unknown or did not apply.
    pub dropped_attributes: usize,
}

impl DesignDocument {
    /// Snapshot a tree and its window root. Records follow paint order.
    #[must_use]
    pub fn capture(tree: &ControlTree, frame: &MainWindowFrame) -> Self {
        Self {
            version: DOCUMENT_VERSION.to_string(),
            main_window: frame.clone(),
            controls: tree.iter().map(ControlRecord::from_control).collect(),
        }
    }

    /// Rebuild the tree.
    ///
    /// 1. Every record becomes an unlinked control.
    /// 2. Parent ids are resolved; missing, self, or cycle-closing parents
    ///    fall back to the root.
    /// 3. Tab page indices are normalized: children of a tab container get a
    ///    page in range (out-of-range pages go to the first page), other
    ///    children get none. Tab containers without a stored tab bar height
    ///    get one derived from their font.
    pub fn restore(&self) -> Result<RestoredDesign, TreeError> {
        let mut dropped_attributes = 0;
        let mut entries = Vec::with_capacity(self.controls.len());
        for record in &self.controls {
            if record.id.get() == 0 {
                formkit_core::warn!(message = "document.restore.zero_id", name = %record.name);
                continue;
            }
            let (control, dropped) = record.to_control();
            dropped_attributes += dropped;
            let parent = record.parent_id.filter(|parent| parent.get() != 0);
            entries.push((control, parent));
        }

        let (mut tree, repairs) = ControlTree::assemble(entries)?;

        let ids: Vec<ControlId> = tree.paint_order().to_vec();
        for id in ids {
            let Some(parent) = tree.parent_of(id) else {
                continue;
            };
            let page_count = match parent {
                ParentRef::Control(parent) => tree
                    .get(parent)
                    .filter(|node| node.kind() == ControlKind::TabContainer)
                    .map(Control::tab_count),
                ParentRef::Root => None,
            };
            let Some(node) = tree.get_mut(id) else {
                continue;
            };
            node.tab_page = match page_count {
                Some(count) => Some(node.tab_page.filter(|page| *page < count).unwrap_or(0)),
                None => None,
            };
            if node.kind() == ControlKind::TabContainer
                && !node.attributes.contains(AttrKey::TabBarHeight)
            {
                let height = TabContainer::tab_bar_height(&node.attributes);
                node.attributes
                    .insert(AttrKey::TabBarHeight, i64::from(height));
            }
        }

        if dropped_attributes > 0 {
            formkit_core::debug!(
                message = "document.restore.dropped_attributes",
                count = dropped_attributes
            );
        }
        Ok(RestoredDesign {
            tree,
            frame: self.main_window.clone(),
            repairs,
            dropped_attributes,
        })
    }

    /// Serialize with the given envelope.
    pub fn encode(&self, envelope: Envelope) -> Result<Vec<u8>, PersistError> {
        let json =
            serde_json::to_vec_pretty(self).map_err(|err| PersistError::Encode(err.to_string()))?;
        Ok(match envelope {
            Envelope::Json => json,
            Envelope::Packed => {
                let mut out = Vec::with_capacity(PACK_MAGIC.len() + json.len());
                out.extend_from_slice(PACK_MAGIC);
                out.extend(xor_with_key(&json));
                out
            }
        })
    }

    /// Parse bytes leniently. Never fails: see [`LoadOutcome`].
    #[must_use]
    pub fn decode(bytes: &[u8]) -> LoadOutcome {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return LoadOutcome::recovered(Corruption::Empty);
        }
        let unpacked;
        let payload = match bytes.strip_prefix(PACK_MAGIC) {
            Some(packed) => {
                unpacked = xor_with_key(packed);
                unpacked.as_slice()
            }
            None => bytes,
        };
        let text = match std::str::from_utf8(payload) {
            Ok(text) => text,
            Err(err) => {
                return LoadOutcome::recovered(Corruption::Undecodable(err.to_string()));
            }
        };
        let root: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(err) => return LoadOutcome::recovered(Corruption::Malformed(err.to_string())),
        };
        let Value::Object(mut root) = root else {
            return LoadOutcome::recovered(Corruption::Malformed(
                "top level is not an object".to_string(),
            ));
        };

        let version = match root.remove("version") {
            Some(Value::String(version)) => version,
            _ => DOCUMENT_VERSION.to_string(),
        };
        if version != DOCUMENT_VERSION {
            formkit_core::warn!(message = "document.decode.version", version = %version);
        }

        let mut skipped = Vec::new();
        let main_window = match root.remove("main_window") {
            None | Some(Value::Null) => MainWindowFrame::default(),
            Some(raw) => match serde_json::from_value(raw) {
                Ok(frame) => frame,
                Err(err) => {
                    skipped.push(SkippedRecord {
                        index: None,
                        reason: format!("main_window: {err}"),
                    });
                    MainWindowFrame::default()
                }
            },
        };

        let raw_controls = match root.remove("controls") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(_) => {
                return LoadOutcome::recovered(Corruption::Malformed(
                    "controls is not an array".to_string(),
                ));
            }
        };
        let mut controls = Vec::with_capacity(raw_controls.len());
        for (index, raw) in raw_controls.into_iter().enumerate() {
            match serde_json::from_value::<ControlRecord>(raw) {
                Ok(record) if record.id.get() == 0 => skipped.push(SkippedRecord {
                    index: Some(index),
                    reason: "control id 0 is invalid".to_string(),
                }),
                Ok(record) if record.id.checked_next().is_err() => skipped.push(SkippedRecord {
                    index: Some(index),
                    reason: format!("control id {} leaves no room for new ids", record.id),
                }),
                Ok(record) => controls.push(record),
                Err(err) => skipped.push(SkippedRecord {
                    index: Some(index),
                    reason: err.to_string(),
                }),
            }
        }
        if !skipped.is_empty() {
            formkit_core::warn!(message = "document.decode.skipped", count = skipped.len());
        }

        LoadOutcome::Loaded {
            document: DesignDocument {
                version,
                main_window,
                controls,
            },
            skipped,
        }
    }

    /// Write to `path`, packed when the extension is [`PACK_EXTENSION`].
    pub fn save(&self, path: &Path) -> Result<(), PersistError> {
        let bytes = self.encode(Envelope::for_path(path))?;
        std::fs::write(path, bytes)?;
        formkit_core::info!(
            message = "document.saved",
            path = %path.display(),
            controls = self.controls.len()
        );
        Ok(())
    }

    /// Read from `path`. Content problems are recovered, I/O problems are not.
    pub fn load(path: &Path) -> Result<LoadOutcome, PersistError> {
        let bytes = std::fs::read(path)?;
        let outcome = Self::decode(&bytes);
        if let LoadOutcome::Recovered { reason, .. } = &outcome {
            formkit_core::warn!(
                message = "document.load.recovered",
                path = %path.display(),
                reason = %reason
            );
            let _ = reason;
        }
        Ok(outcome)
    }
}

fn xor_with_key(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .zip(PACK_KEY.iter().cycle())
        .map(|(byte, key)| byte ^ key)
        .collect()
}

/// On-disk wrapping of the JSON payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Envelope {
    #[default]
    Json,
    Packed,
}

impl Envelope {
    /// Packed for `*.fkpack`, JSON otherwise.
    #[must_use]
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case(PACK_EXTENSION) => Self::Packed,
            _ => Self::Json,
        }
    }
}

/// A record that could not be read and was left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// Position in the `controls` array; `None` for the window root.
    pub index: Option<usize>,
    pub reason: String,
}

/// Why a document was replaced by an empty one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Corruption {
    Empty,
    Undecodable(String),
    Malformed(String),
}

impl fmt::Display for Corruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "document is empty"),
            Self::Undecodable(reason) => write!(f, "document could not be decoded: {reason}"),
            Self::Malformed(reason) => write!(f, "document is malformed: {reason}"),
        }
    }
}

/// Result of decoding a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded {
        document: DesignDocument,
        skipped: Vec<SkippedRecord>,
    },
    /// The content was unusable; `document` is the empty default.
    Recovered {
        document: DesignDocument,
        reason: Corruption,
    },
}

impl LoadOutcome {
    fn recovered(reason: Corruption) -> Self {
        Self::Recovered {
            document: DesignDocument::default(),
            reason,
        }
    }

    #[must_use]
    pub fn document(&self) -> &DesignDocument {
        match self {
            Self::Loaded { document, .. } | Self::Recovered { document, .. } => document,
        }
    }

    #[must_use]
    pub fn into_document(self) -> DesignDocument {
        match self {
            Self::Loaded { document, .. } | Self::Recovered { document, .. } => document,
        }
    }

    #[must_use]
    pub fn corruption(&self) -> Option<&Corruption> {
        match self {
            Self::Loaded { .. } => None,
            Self::Recovered { reason, .. } => Some(reason),
        }
    }
}

/// Persistence failures that cannot be recovered locally.
#[derive(Debug)]
pub enum PersistError {
    Io(io::Error),
    Encode(String),
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "document I/O failed: {err}"),
            Self::Encode(reason) => write!(f, "document could not be encoded: {reason}"),
        }
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Encode(_) => None,
        }
    }
}

impl From<io::Error> for PersistError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::absolute_rect;

    fn id(raw: u64) -> ControlId {
        ControlId::new(raw).expect("test ID must be non-zero")
    }

    fn sample_tree() -> ControlTree {
        let mut tree = ControlTree::new();
        let tabs = tree
            .create(ControlKind::TabContainer, Rect::new(100, 100, 300, 200), ParentRef::Root)
            .expect("tabs");
        let button = tree
            .create(ControlKind::Button, Rect::new(10, 10, 50, 30), ParentRef::Control(tabs))
            .expect("button");
        let node = tree.require_mut(button).expect("button");
        node.tab_page = Some(1);
        node.events.push(EventBinding::new("clicked", "self.on_ok"));
        tree
    }

    #[test]
    fn capture_restore_preserves_links_and_pages() {
        let tree = sample_tree();
        let frame = MainWindowFrame::default();
        let doc = DesignDocument::capture(&tree, &frame);
        assert_eq!(doc.controls.len(), 2);
        assert_eq!(doc.controls[1].parent_id, Some(id(1)));
        assert_eq!(doc.controls[1].parent_tab_page_index, Some(1));

        let restored = doc.restore().expect("restore");
        assert!(restored.repairs.is_empty());
        assert_eq!(restored.dropped_attributes, 0);
        assert_eq!(restored.tree, tree);
        assert_eq!(
            absolute_rect(&restored.tree, &restored.frame, id(2)),
            absolute_rect(&tree, &frame, id(2))
        );
    }

    #[test]
    fn json_and_packed_envelopes_decode() {
        let doc = DesignDocument::capture(&sample_tree(), &MainWindowFrame::default());
        for envelope in [Envelope::Json, Envelope::Packed] {
            let bytes = doc.encode(envelope).expect("encode");
            assert_eq!(bytes.starts_with(PACK_MAGIC), envelope == Envelope::Packed);
            match DesignDocument::decode(&bytes) {
                LoadOutcome::Loaded { document, skipped } => {
                    assert!(skipped.is_empty());
                    assert_eq!(document, doc);
                }
                other => panic!("unexpected outcome {other:?}"),
            }
        }
    }

    #[test]
    fn corrupt_input_recovers_to_empty_document() {
        let cases: [(&[u8], fn(&Corruption) -> bool); 4] = [
            (b"", |c| matches!(c, Corruption::Empty)),
            (b"  \n", |c| matches!(c, Corruption::Empty)),
            (b"{\"version\": ", |c| matches!(c, Corruption::Malformed(_))),
            (b"[1, 2]", |c| matches!(c, Corruption::Malformed(_))),
        ];
        for (bytes, check) in cases {
            let outcome = DesignDocument::decode(bytes);
            let reason = outcome.corruption().expect("recovered");
            assert!(check(reason), "{reason:?}");
            assert_eq!(outcome.document(), &DesignDocument::default());
        }

        let mut packed = PACK_MAGIC.to_vec();
        packed.extend([0xFF, 0xFE, 0x80]);
        assert!(matches!(
            DesignDocument::decode(&packed).corruption(),
            Some(Corruption::Undecodable(_))
        ));
    }

    #[test]
    fn bad_records_are_skipped() {
        let text = r#"{
            "version": "1.0",
            "main_window": {"width": 640},
            "controls": [
                {"id": 1, "kind": "button", "name": "ok", "rect": [0, 0, 50, 30]},
                {"id": 2, "kind": "hologram", "name": "?", "rect": [0, 0, 1, 1]},
                {"id": 0, "kind": "label", "name": "zero", "rect": [0, 0, 1, 1]},
                {"kind": "label"}
            ]
        }"#;
        match DesignDocument::decode(text.as_bytes()) {
            LoadOutcome::Loaded { document, skipped } => {
                assert_eq!(document.main_window.width, 640);
                assert_eq!(document.controls.len(), 1);
                let indices: Vec<_> = skipped.iter().map(|s| s.index).collect();
                assert_eq!(indices, vec![Some(1), Some(2), Some(3)]);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn restore_normalizes_tab_pages_and_drops_unknown_attributes() {
        let text = r#"{
            "version": "1.0",
            "main_window": {},
            "controls": [
                {"id": 3, "kind": "label", "name": "far", "rect": [0, 0, 50, 30],
                 "parent_id": 1, "parent_tab_page_index": 7,
                 "attributes": {"text": "hi", "sparkle": true, "tab_titles": ["x"]}},
                {"id": 1, "kind": "tab_container", "name": "tabs", "rect": [0, 0, 300, 200],
                 "parent_id": null, "parent_tab_page_index": -1,
                 "attributes": {"tab_titles": ["A", "B"], "font_size": 12}},
                {"id": 2, "kind": "button", "name": "root", "rect": [0, 0, 50, 30],
                 "parent_id": 99, "parent_tab_page_index": 0}
            ]
        }"#;
        let doc = DesignDocument::decode(text.as_bytes()).into_document();
        let restored = doc.restore().expect("restore");
        let tree = &restored.tree;

        assert_eq!(tree.parent_of(id(3)), Some(ParentRef::Control(id(1))));
        assert_eq!(tree.get(id(3)).and_then(|c| c.tab_page), Some(0));
        assert_eq!(tree.get(id(2)).and_then(|c| c.tab_page), None);
        assert_eq!(tree.parent_of(id(2)), Some(ParentRef::Root));
        assert_eq!(
            restored.repairs,
            vec![LinkRepair::MissingParent {
                id: id(2),
                parent: id(99)
            }]
        );
        // "sparkle" is unknown and "tab_titles" does not apply to a label.
        assert_eq!(restored.dropped_attributes, 2);
        assert_eq!(tree.get(id(1)).map(Control::tab_bar_height), Some(36));
        tree.validate().expect("valid");
    }

    #[test]
    fn envelope_from_extension() {
        assert_eq!(Envelope::for_path(Path::new("a/b.fkpack")), Envelope::Packed);
        assert_eq!(Envelope::for_path(Path::new("a/b.FKPACK")), Envelope::Packed);
        assert_eq!(Envelope::for_path(Path::new("a/b.json")), Envelope::Json);
        assert_eq!(Envelope::for_path(Path::new("noext")), Envelope::Json);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = DesignDocument::load(&dir.path().join("absent.json")).expect_err("missing");
        assert!(matches!(err, PersistError::Io(_)));
    }
}
