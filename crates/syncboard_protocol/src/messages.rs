//! Protocol messages.

use crate::error::ProtocolResult;
use crate::model::{empty_list, ApplicationState, Item, Section};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Tag of the full-state snapshot sent to a client on join.
pub const INIT_STATE: &str = "INIT_STATE";

/// Tag of a full-state mutation sent by a client.
pub const DROP_UPDATE: &str = "DROP_UPDATE";

/// A frame originated by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Full snapshot, sent once right after a connection is accepted.
    #[serde(rename = "INIT_STATE")]
    InitState {
        /// Current board state.
        state: ApplicationState,
    },
}

impl ServerMessage {
    /// Encodes to JSON text.
    pub fn encode(&self) -> ProtocolResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Payload of a `DROP_UPDATE` frame.
///
/// Both lists are carried as the client sent them; a missing list is `[]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropUpdate {
    /// Replacement section list.
    #[serde(default = "empty_list")]
    pub sections: Value,
    /// Replacement unassigned item list.
    #[serde(default = "empty_list")]
    pub items: Value,
}

impl DropUpdate {
    /// Creates a drop update from typed sections and items.
    pub fn new(sections: Vec<Section>, items: Vec<Item>) -> Self {
        let state = ApplicationState::new(sections, items);
        Self {
            sections: state.sections,
            items: state.items,
        }
    }

    fn from_frame(mut map: Map<String, Value>) -> Self {
        Self {
            sections: map.remove("sections").unwrap_or_else(empty_list),
            items: map.remove("items").unwrap_or_else(empty_list),
        }
    }

    /// Converts into an unstamped state.
    pub fn into_state(self) -> ApplicationState {
        ApplicationState::from_parts(self.sections, self.items)
    }

    /// Encodes as a tagged client frame.
    pub fn encode(&self) -> ProtocolResult<String> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            map.insert("type".into(), Value::String(DROP_UPDATE.into()));
        }
        Ok(serde_json::to_string(&value)?)
    }
}

/// What a client frame asks the server to do.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageKind {
    /// Full-state mutation; persisted, then relayed.
    DropUpdate(DropUpdate),
    /// Any other frame; relayed only. Holds the tag if one was present.
    Other(Option<String>),
}

/// A parsed client frame.
///
/// The original text is kept so peers receive exactly the bytes the sender
/// wrote; only the tag and, for `DROP_UPDATE`, the two lists are read.
#[derive(Debug, Clone)]
pub struct Envelope {
    raw: Arc<str>,
    kind: MessageKind,
}

impl Envelope {
    /// Parses a client frame.
    ///
    /// Any JSON value is accepted. Frames that are not objects, or whose
    /// `type` is not a string, are relayed as untagged.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid JSON.
    pub fn parse(text: &str) -> ProtocolResult<Self> {
        let kind = match serde_json::from_str::<Value>(text)? {
            Value::Object(map) => {
                let tag = map.get("type").and_then(Value::as_str).map(str::to_owned);
                if tag.as_deref() == Some(DROP_UPDATE) {
                    MessageKind::DropUpdate(DropUpdate::from_frame(map))
                } else {
                    MessageKind::Other(tag)
                }
            }
            _ => MessageKind::Other(None),
        };

        Ok(Self {
            raw: Arc::from(text),
            kind,
        })
    }

    /// The frame exactly as received.
    pub fn raw(&self) -> &Arc<str> {
        &self.raw
    }

    /// The decoded message kind.
    pub fn kind(&self) -> &MessageKind {
        &self.kind
    }

    /// The frame's `type` tag, if any.
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            MessageKind::DropUpdate(_) => Some(DROP_UPDATE),
            MessageKind::Other(tag) => tag.as_deref(),
        }
    }

    /// Splits into the raw text and the decoded kind.
    pub fn into_parts(self) -> (Arc<str>, MessageKind) {
        (self.raw, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn init_state_encoding() {
        let message = ServerMessage::InitState {
            state: ApplicationState::default().stamped(1234),
        };
        let value: Value = serde_json::from_str(&message.encode().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"type": "INIT_STATE", "state": {"sections": [], "items": [], "lastUpdated": 1234}})
        );
    }

    #[test]
    fn parse_drop_update() {
        let text = r#"{"type":"DROP_UPDATE","sections":[{"id":1,"title":"x","items":[]}],"items":[]}"#;
        let envelope = Envelope::parse(text).unwrap();

        assert_eq!(envelope.tag(), Some(DROP_UPDATE));
        assert_eq!(&**envelope.raw(), text);
        match envelope.kind() {
            MessageKind::DropUpdate(update) => {
                assert_eq!(update.sections, json!([{"id": 1, "title": "x", "items": []}]));
                assert_eq!(update.items, json!([]));
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn drop_update_carries_any_lists() {
        let cases = [
            (
                r#"{"type":"DROP_UPDATE","sections":[],"items":[{"id":2}]}"#,
                json!([]),
                json!([{"id": 2}]),
            ),
            (
                r#"{"type":"DROP_UPDATE","sections":[{"id":1}]}"#,
                json!([{"id": 1}]),
                json!([]),
            ),
            (
                r#"{"type":"DROP_UPDATE","sections":"nope","items":[{"id":"u-3","label":"x"}]}"#,
                json!("nope"),
                json!([{"id": "u-3", "label": "x"}]),
            ),
        ];

        for (text, sections, items) in cases {
            let envelope = Envelope::parse(text).unwrap();
            let expected = MessageKind::DropUpdate(DropUpdate { sections, items });
            assert_eq!(envelope.kind(), &expected, "{text}");
        }
    }

    #[test]
    fn drop_update_encode_parses_back() {
        let update = DropUpdate::new(vec![Section::new(3, "s", vec![Item::new(4, "i")])], vec![]);
        let envelope = Envelope::parse(&update.encode().unwrap()).unwrap();
        assert_eq!(envelope.kind(), &MessageKind::DropUpdate(update));
    }

    #[test]
    fn parse_other_tags() {
        let envelope = Envelope::parse(r#"{"type":"DRAG_START","itemId":3}"#).unwrap();
        assert_eq!(envelope.kind(), &MessageKind::Other(Some("DRAG_START".into())));

        let untagged = Envelope::parse(r#"{"hello":1}"#).unwrap();
        assert_eq!(untagged.kind(), &MessageKind::Other(None));
        assert_eq!(untagged.tag(), None);

        let numeric_tag = Envelope::parse(r#"{"type":7}"#).unwrap();
        assert_eq!(numeric_tag.kind(), &MessageKind::Other(None));
    }

    #[test]
    fn any_json_value_is_relayable() {
        for text in ["[1,2]", "\"hi\"", "42", "null"] {
            let envelope = Envelope::parse(text).unwrap();
            assert_eq!(envelope.kind(), &MessageKind::Other(None));
            assert_eq!(&**envelope.raw(), text);
        }
    }

    #[test]
    fn parse_rejects_non_json() {
        assert!(matches!(Envelope::parse("not json"), Err(ProtocolError::Json(_))));
        assert!(matches!(Envelope::parse("{\"type\":"), Err(ProtocolError::Json(_))));
    }

    proptest! {
        #[test]
        fn opaque_frames_keep_their_bytes(tag in "[A-Z_]{1,16}", n in any::<i64>()) {
            prop_assume!(tag != DROP_UPDATE);
            let text = json!({"type": tag.clone(), "n": n}).to_string();
            let envelope = Envelope::parse(&text).unwrap();
            prop_assert_eq!(&**envelope.raw(), text.as_str());
            prop_assert_eq!(envelope.tag(), Some(tag.as_str()));
        }

        #[test]
        fn non_json_never_parses(text in "[^\\[\\]{}\"0-9tfn -]{1,32}") {
            prop_assert!(Envelope::parse(&text).is_err());
        }
    }
}
