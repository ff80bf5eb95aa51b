//! # Relay Messages
//!
//! The single domain entity exchanged between proxy, controller and toy.
//!
//! On the wire a message is a JSON object:
//! ```text
//! { "type": "register"|"status"|"command"|"ping"|"error",
//!   "seq": <integer>, "data": <any>,
//!   "uid": <string>,      absent only when type == "register"
//!   "sticky": true }      present only when true
//! ```
//!
//! [`Message`] can only be built with the fields its [`MessageKind`] requires,
//! so a value of this type is always schema-valid. [`Record`] is the untyped
//! object form used on the way in and out of the frame codec.

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Untyped JSON object form of a message.
pub type Record = Map<String, Value>;

pub const FIELD_TYPE: &str = "type";
pub const FIELD_SEQ: &str = "seq";
pub const FIELD_DATA: &str = "data";
pub const FIELD_UID: &str = "uid";
pub const FIELD_STICKY: &str = "sticky";

const REGISTER_FIELDS: &[&str] = &[FIELD_TYPE, FIELD_SEQ, FIELD_DATA];
const ADDRESSED_FIELDS: &[&str] = &[FIELD_TYPE, FIELD_SEQ, FIELD_DATA, FIELD_UID];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// A device announcing itself. It has no uid until the proxy assigns one.
    Register,
    Status,
    Command,
    Ping,
    Error,
}

impl MessageKind {
    pub const ALL: [MessageKind; 5] = [
        MessageKind::Register,
        MessageKind::Status,
        MessageKind::Command,
        MessageKind::Ping,
        MessageKind::Error,
    ];

    /// Wire name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Register => "register",
            MessageKind::Status => "status",
            MessageKind::Command => "command",
            MessageKind::Ping => "ping",
            MessageKind::Error => "error",
        }
    }

    /// Fields that must be present on a record of this kind, in check order.
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            MessageKind::Register => REGISTER_FIELDS,
            MessageKind::Status | MessageKind::Command | MessageKind::Ping | MessageKind::Error => {
                ADDRESSED_FIELDS
            }
        }
    }

    pub fn requires_uid(self) -> bool {
        self != MessageKind::Register
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        MessageKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ProtocolError::UnknownType(s.to_string()))
    }
}

/// A validated relay message.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    kind: MessageKind,
    seq: i64,
    data: Value,
    uid: Option<String>,
    sticky: bool,
    extra: Record,
}

impl Message {
    /// A `register` message. The uid can be attached with [`Message::with_uid`].
    pub fn register(seq: i64, data: impl Into<Value>) -> Self {
        Self {
            kind: MessageKind::Register,
            seq,
            data: data.into(),
            uid: None,
            sticky: false,
            extra: Record::new(),
        }
    }

    /// A message of any kind that carries a uid.
    pub fn addressed(
        kind: MessageKind,
        seq: i64,
        data: impl Into<Value>,
        uid: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            seq,
            data: data.into(),
            uid: Some(uid.into()),
            sticky: false,
            extra: Record::new(),
        }
    }

    pub fn status(seq: i64, data: impl Into<Value>, uid: impl Into<String>) -> Self {
        Self::addressed(MessageKind::Status, seq, data, uid)
    }

    pub fn command(seq: i64, data: impl Into<Value>, uid: impl Into<String>) -> Self {
        Self::addressed(MessageKind::Command, seq, data, uid)
    }

    pub fn ping(seq: i64, data: impl Into<Value>, uid: impl Into<String>) -> Self {
        Self::addressed(MessageKind::Ping, seq, data, uid)
    }

    pub fn error(seq: i64, data: impl Into<Value>, uid: impl Into<String>) -> Self {
        Self::addressed(MessageKind::Error, seq, data, uid)
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    pub fn with_sticky(mut self, sticky: bool) -> Self {
        self.sticky = sticky;
        self
    }

    /// Attach a field outside the wire schema. Encode never writes it.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn seq(&self) -> i64 {
        self.seq
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    pub fn is_sticky(&self) -> bool {
        self.sticky
    }

    /// Fields a decoded frame carried beyond the wire schema.
    pub fn extra(&self) -> &Record {
        &self.extra
    }

    /// Copy of the message restricted to the fields encode writes.
    pub fn whitelisted(&self) -> Self {
        Self {
            extra: Record::new(),
            ..self.clone()
        }
    }

    /// Object form of the message, extras included.
    pub fn to_record(&self) -> Record {
        let mut record = self.extra.clone();
        record.insert(FIELD_TYPE.into(), Value::from(self.kind.as_str()));
        record.insert(FIELD_SEQ.into(), Value::from(self.seq));
        record.insert(FIELD_DATA.into(), self.data.clone());
        if let Some(uid) = &self.uid {
            record.insert(FIELD_UID.into(), Value::from(uid.as_str()));
        }
        if self.sticky {
            record.insert(FIELD_STICKY.into(), Value::Bool(true));
        } else {
            record.remove(FIELD_STICKY);
        }
        record
    }
}

impl TryFrom<Record> for Message {
    type Error = ProtocolError;

    /// Build a message from a record that already passed validation.
    ///
    /// Presence is re-checked, so an unvalidated record fails the same way the
    /// validator would. Schema fields must also carry the right JSON types.
    fn try_from(mut record: Record) -> Result<Self> {
        let kind = crate::core::validator::check(&record)?;

        record.remove(FIELD_TYPE);
        let seq = match record.remove(FIELD_SEQ) {
            Some(Value::Number(n)) => n.as_i64().ok_or(ProtocolError::InvalidField {
                field: FIELD_SEQ,
                expected: "integer",
            })?,
            _ => {
                return Err(ProtocolError::InvalidField {
                    field: FIELD_SEQ,
                    expected: "integer",
                })
            }
        };
        let data = record.remove(FIELD_DATA).unwrap_or(Value::Null);
        let uid = match record.remove(FIELD_UID) {
            None if !kind.requires_uid() => None,
            Some(Value::String(uid)) => Some(uid),
            _ => {
                return Err(ProtocolError::InvalidField {
                    field: FIELD_UID,
                    expected: "string",
                })
            }
        };
        let sticky = match record.remove(FIELD_STICKY) {
            None => false,
            Some(Value::Bool(sticky)) => sticky,
            Some(_) => {
                return Err(ProtocolError::InvalidField {
                    field: FIELD_STICKY,
                    expected: "boolean",
                })
            }
        };

        Ok(Self {
            kind,
            seq,
            data,
            uid,
            sticky,
            extra: record,
        })
    }
}
