//! Messages exchanged between the render context and the worker.
//!
//! The set is closed: both sides match [`Message`] exhaustively, so adding
//! a variant is a compile error until every handler deals with it.
//!
//! ```text
//! Render                                  Worker
//!   |                                       |
//!   |<---------------- Ready ---------------|  (once, at startup)
//!   |--- SetInput{generation, text} ------->|  replace handle
//!   |--- SetBudget{amount} ---------------->|  update budget, re-check GC
//!   |--- StepForward{amount} -------------->|  advance, GC, prune, serialize
//!   |<-- SerializedResult{generation, ..} --|  one per StepForward
//! ```
//!
//! On an external wire each message is a JSON object with a `type` tag,
//! e.g. `{"type":"step_forward","amount":2}`.

use std::error::Error;
use std::fmt;

use quadlife_core::InputGeneration;
use serde::{Deserialize, Serialize};

/// Which context a message is addressed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Render context to worker.
    ToWorker,
    /// Worker to render context.
    ToRender,
}

/// A message crossing the thread boundary.
///
/// Messages are plain values moved through a channel; neither side
/// retains access to a message once it has been sent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// The worker is initialized and waiting for input.
    Ready,
    /// Replace the worker's handle with one built from `text`.
    SetInput {
        /// Load sequence number assigned by the render context.
        generation: InputGeneration,
        /// Pattern text.
        text: String,
    },
    /// Advance the worker's handle by `amount` generations.
    StepForward {
        /// Generations to advance; a power of two in practice.
        amount: u64,
    },
    /// Set the worker's node-count threshold.
    SetBudget {
        /// Node-count threshold.
        amount: u64,
    },
    /// Snapshot of the worker's handle after a step.
    SerializedResult {
        /// Generation of the input the snapshot descends from.
        generation: InputGeneration,
        /// Snapshot bytes, decoded with `Engine::deserialize`.
        bytes: Vec<u8>,
        /// Node count of the worker's working handle.
        node_count: u64,
    },
}

/// Wire tags, in declaration order.
pub const TAGS: [&str; 5] = [
    "ready",
    "set_input",
    "step_forward",
    "set_budget",
    "serialized_result",
];

impl Message {
    /// The wire tag of this message.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Ready => TAGS[0],
            Self::SetInput { .. } => TAGS[1],
            Self::StepForward { .. } => TAGS[2],
            Self::SetBudget { .. } => TAGS[3],
            Self::SerializedResult { .. } => TAGS[4],
        }
    }

    /// The context this message is addressed to.
    pub fn direction(&self) -> Direction {
        match self {
            Self::Ready | Self::SerializedResult { .. } => Direction::ToRender,
            Self::SetInput { .. } | Self::StepForward { .. } | Self::SetBudget { .. } => {
                Direction::ToWorker
            }
        }
    }

    /// Encode as a tagged JSON object.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Malformed {
            reason: e.to_string(),
        })
    }

    /// Decode a tagged JSON object.
    ///
    /// The tag is checked before the payload so an unrecognised message
    /// is reported as [`ProtocolError::UnknownTag`] rather than as a
    /// generic decode failure.
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| ProtocolError::Malformed {
                reason: e.to_string(),
            })?;
        let tag = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or(ProtocolError::MissingTag)?;
        if !TAGS.contains(&tag) {
            return Err(ProtocolError::UnknownTag {
                tag: tag.to_string(),
            });
        }
        serde_json::from_value(value).map_err(|e| ProtocolError::Malformed {
            reason: e.to_string(),
        })
    }
}

// ── ProtocolError ───────────────────────────────────────────────

/// Errors decoding a message from the wire.
///
/// None of these is fatal: the receiving side logs the frame and keeps
/// processing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    /// The `type` tag names no known message.
    UnknownTag {
        /// The tag that was received.
        tag: String,
    },
    /// The frame has no string `type` field.
    MissingTag,
    /// The frame is not valid JSON or its payload does not match the tag.
    Malformed {
        /// Decoder message.
        reason: String,
    },
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTag { tag } => write!(f, "unknown message type {tag:?}"),
            Self::MissingTag => write!(f, "message has no type tag"),
            Self::Malformed { reason } => write!(f, "malformed message: {reason}"),
        }
    }
}

impl Error for ProtocolError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape_uses_type_tag() {
        let json = Message::StepForward { amount: 2 }.to_json().unwrap();
        assert_eq!(json, r#"{"type":"step_forward","amount":2}"#);
        assert_eq!(Message::Ready.to_json().unwrap(), r#"{"type":"ready"}"#);
    }

    #[test]
    fn every_variant_decodes_from_its_wire_form() {
        let all = [
            Message::Ready,
            Message::SetInput {
                generation: InputGeneration(3),
                text: "x = 1, y = 1\no!".into(),
            },
            Message::StepForward { amount: 8 },
            Message::SetBudget { amount: 1 << 20 },
            Message::SerializedResult {
                generation: InputGeneration(3),
                bytes: vec![1, 2, 3],
                node_count: 42,
            },
        ];
        for (msg, tag) in all.iter().zip(TAGS) {
            assert_eq!(msg.tag(), tag);
            assert_eq!(&Message::from_json(&msg.to_json().unwrap()).unwrap(), msg);
        }
    }

    #[test]
    fn unknown_tag_is_reported_by_name() {
        let err = Message::from_json(r#"{"type":"set_rle","data":"!"}"#).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::UnknownTag {
                tag: "set_rle".into()
            }
        );
    }

    #[test]
    fn missing_tag_and_bad_payload_are_distinguished() {
        assert_eq!(
            Message::from_json(r#"{"amount":2}"#).unwrap_err(),
            ProtocolError::MissingTag
        );
        assert!(matches!(
            Message::from_json(r#"{"type":"step_forward","amount":"two"}"#).unwrap_err(),
            ProtocolError::Malformed { .. }
        ));
        assert!(matches!(
            Message::from_json("not json").unwrap_err(),
            ProtocolError::Malformed { .. }
        ));
    }

    #[test]
    fn directions() {
        assert_eq!(Message::Ready.direction(), Direction::ToRender);
        assert_eq!(
            Message::SetBudget { amount: 1 }.direction(),
            Direction::ToWorker
        );
    }
}
