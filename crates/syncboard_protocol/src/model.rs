//! Board document types.
//!
//! The server treats an [`ApplicationState`] as opaque and authoritative: the
//! `sections` and `items` lists are kept exactly as the client sent them, never
//! validated, only stored and handed back out. [`Item`] and [`Section`] are
//! typed builders for boards the server creates itself, such as the seed.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Identifier of an [`Item`].
pub type ItemId = i64;

/// Identifier of a [`Section`].
pub type SectionId = i64;

/// A single draggable entry on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique item id.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Client-defined fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Item {
    /// Creates an item with no extra fields.
    pub fn new(id: ItemId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            extra: Map::new(),
        }
    }
}

impl From<Item> for Value {
    fn from(item: Item) -> Self {
        let mut map = item.extra;
        map.insert("id".into(), item.id.into());
        map.insert("name".into(), item.name.into());
        Value::Object(map)
    }
}

/// A titled group owning an ordered list of items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Unique section id.
    pub id: SectionId,
    /// Section title.
    pub title: String,
    /// Items placed in this section, in display order.
    #[serde(default)]
    pub items: Vec<Item>,
    /// Client-defined fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Section {
    /// Creates a section with no extra fields.
    pub fn new(id: SectionId, title: impl Into<String>, items: Vec<Item>) -> Self {
        Self {
            id,
            title: title.into(),
            items,
            extra: Map::new(),
        }
    }
}

impl From<Section> for Value {
    fn from(section: Section) -> Self {
        let mut map = section.extra;
        map.insert("id".into(), section.id.into());
        map.insert("title".into(), section.title.into());
        map.insert("items".into(), list(section.items));
        Value::Object(map)
    }
}

/// The whole board: placed sections, unassigned items and a modification stamp.
///
/// `sections` and `items` are normally arrays of section and item objects, but
/// any JSON is accepted and kept as is. A missing list decodes as `[]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationState {
    /// Sections in display order.
    #[serde(default = "empty_list")]
    pub sections: Value,
    /// Items not yet placed in any section.
    #[serde(default = "empty_list")]
    pub items: Value,
    /// Milliseconds since the Unix epoch of the last save.
    #[serde(default, deserialize_with = "lenient_stamp")]
    pub last_updated: u64,
}

impl Default for ApplicationState {
    fn default() -> Self {
        Self::from_parts(empty_list(), empty_list())
    }
}

impl ApplicationState {
    /// Creates an unstamped state from typed sections and items.
    pub fn new(sections: Vec<Section>, items: Vec<Item>) -> Self {
        Self::from_parts(list(sections), list(items))
    }

    /// Creates an unstamped state from client-supplied JSON.
    pub fn from_parts(sections: Value, items: Value) -> Self {
        Self {
            sections,
            items,
            last_updated: 0,
        }
    }

    /// Decodes a stored snapshot.
    ///
    /// Any JSON object is a board; only text that is not JSON, or JSON that is
    /// not an object, is rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` is not a JSON object.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        match serde_json::from_slice::<Value>(bytes)? {
            value @ Value::Object(_) => serde_json::from_value(value),
            _ => Err(<serde_json::Error as serde::de::Error>::custom(
                "snapshot is not a JSON object",
            )),
        }
    }

    /// Returns this state with `last_updated` replaced.
    #[must_use]
    pub fn stamped(mut self, at: u64) -> Self {
        self.last_updated = at;
        self
    }

    /// The sections, or nothing if `sections` is not an array.
    pub fn section_list(&self) -> &[Value] {
        as_slice(&self.sections)
    }

    /// The unassigned items, or nothing if `items` is not an array.
    pub fn item_list(&self) -> &[Value] {
        as_slice(&self.items)
    }

    /// Number of items on the board, placed or not.
    pub fn item_count(&self) -> usize {
        self.item_list().len() + self.placed_items().count()
    }

    /// Item ids that occur more than once across sections and the unassigned list.
    ///
    /// Uniqueness is maintained by clients; this is for diagnostics only.
    pub fn duplicate_item_ids(&self) -> Vec<Value> {
        let items = self.placed_items().chain(self.item_list());
        duplicates(items.filter_map(|item| item.get("id")))
    }

    /// Section ids that occur more than once.
    pub fn duplicate_section_ids(&self) -> Vec<Value> {
        duplicates(self.section_list().iter().filter_map(|s| s.get("id")))
    }

    fn placed_items(&self) -> impl Iterator<Item = &Value> {
        self.section_list()
            .iter()
            .flat_map(|s| s.get("items").map(as_slice).unwrap_or_default())
    }
}

pub(crate) fn empty_list() -> Value {
    Value::Array(Vec::new())
}

fn list<T: Into<Value>>(entries: Vec<T>) -> Value {
    Value::Array(entries.into_iter().map(Into::into).collect())
}

fn as_slice(value: &Value) -> &[Value] {
    value.as_array().map(Vec::as_slice).unwrap_or_default()
}

/// Accepts any JSON number; fractions are truncated, anything else reads as 0.
fn lenient_stamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let stamp = value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0)
            .map(|f| f as u64)
    });
    Ok(stamp.unwrap_or(0))
}

fn duplicates<'a>(ids: impl Iterator<Item = &'a Value>) -> Vec<Value> {
    let mut seen = BTreeSet::new();
    let mut dup = BTreeMap::new();
    for id in ids {
        let key = id.to_string();
        if !seen.insert(key.clone()) {
            dup.entry(key).or_insert_with(|| id.clone());
        }
    }
    dup.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_field_names() {
        let state = ApplicationState::new(
            vec![Section::new(1, "x", vec![Item::new(7, "a")])],
            vec![Item::new(8, "b")],
        )
        .stamped(42);

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(
            value,
            json!({
                "sections": [{"id": 1, "title": "x", "items": [{"id": 7, "name": "a"}]}],
                "items": [{"id": 8, "name": "b"}],
                "lastUpdated": 42
            })
        );
    }

    #[test]
    fn client_data_is_kept_as_sent() {
        let raw = json!({
            "sections": [{"id": "s-1", "color": "red", "items": [
                {"id": 2, "pinned": true}
            ]}],
            "items": [{"name": "no id"}],
            "lastUpdated": 5
        });

        let state: ApplicationState = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(state.sections[0]["color"], "red");
        assert_eq!(state.item_count(), 2);
        assert_eq!(serde_json::to_value(&state).unwrap(), raw);
    }

    #[test]
    fn missing_fields_default() {
        let state: ApplicationState = serde_json::from_str("{}").unwrap();
        assert_eq!(state, ApplicationState::default());
        assert_eq!(state.sections, json!([]));
    }

    #[test]
    fn non_array_lists_are_opaque() {
        let state: ApplicationState =
            serde_json::from_str(r#"{"sections":null,"items":{"a":1}}"#).unwrap();
        assert_eq!(state.sections, Value::Null);
        assert!(state.section_list().is_empty());
        assert_eq!(state.item_count(), 0);
    }

    #[test]
    fn stamp_accepts_any_number() {
        let float: ApplicationState = serde_json::from_str(r#"{"lastUpdated":1.7e12}"#).unwrap();
        assert_eq!(float.last_updated, 1_700_000_000_000);

        let text: ApplicationState = serde_json::from_str(r#"{"lastUpdated":"today"}"#).unwrap();
        assert_eq!(text.last_updated, 0);

        let negative: ApplicationState = serde_json::from_str(r#"{"lastUpdated":-4}"#).unwrap();
        assert_eq!(negative.last_updated, 0);
    }

    #[test]
    fn from_slice_requires_an_object() {
        let state = ApplicationState::from_slice(br#"{"sections":[{"id":1}]}"#).unwrap();
        assert_eq!(state.section_list().len(), 1);

        assert!(ApplicationState::from_slice(b"[1, 2]").is_err());
        assert!(ApplicationState::from_slice(b"{\"sections\": [").is_err());
    }

    #[test]
    fn counts_and_duplicates() {
        let state = ApplicationState::new(
            vec![
                Section::new(1, "a", vec![Item::new(1, "x"), Item::new(2, "y")]),
                Section::new(1, "b", vec![Item::new(3, "z")]),
            ],
            vec![Item::new(2, "dup")],
        );

        assert_eq!(state.item_count(), 4);
        assert_eq!(state.duplicate_item_ids(), vec![json!(2)]);
        assert_eq!(state.duplicate_section_ids(), vec![json!(1)]);
    }
}
