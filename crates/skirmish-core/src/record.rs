//! Flat text records for persisting entities.
//!
//! One entity per line:
//!
//! ```text
//! <kind tag> <name> <x> <y>
//! ```
//!
//! Kind tags are `1` (Ork), `2` (Squirrel) and `3` (Druid). Fields are
//! separated by ASCII whitespace, so the name is escaped to stay a single
//! token:
//!
//! | Character | Written as |
//! |---|---|
//! | `\` | `\\` |
//! | space | `\s` |
//! | tab | `\t` |
//! | newline | `\n` |
//! | carriage return | `\r` |
//! | form feed | `\f` |
//!
//! The empty name is written as the lone token `\0`.
//!
//! ```
//! use skirmish_core::entity::EntityKind;
//! use skirmish_core::record::Record;
//!
//! let record = Record::new(EntityKind::Druid, "old elm", 3, -4);
//! assert_eq!(record.to_string(), r"3 old\selm 3 -4");
//!
//! let parsed: Record = r"3 old\selm 3 -4".parse().unwrap();
//! assert_eq!(parsed, record);
//! ```

use std::fmt;
use std::str::FromStr;

use glam::IVec2;

use crate::entity::{Entity, EntityKind, EntitySnapshot};
use crate::error::RecordError;

const EMPTY_NAME: &str = "\\0";

/// One parsed entity line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Combatant kind.
    pub kind: EntityKind,
    /// Unescaped display name.
    pub name: String,
    /// Stored position.
    pub position: IVec2,
}

impl Record {
    /// Builds a record from its parts.
    #[must_use]
    pub fn new(kind: EntityKind, name: impl Into<String>, x: i32, y: i32) -> Self {
        Self {
            kind,
            name: name.into(),
            position: IVec2::new(x, y),
        }
    }

    /// Captures the persistent fields of a live entity.
    #[must_use]
    pub fn of(entity: &Entity) -> Self {
        Self::from(&entity.snapshot())
    }

    /// Parses one line. Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns the first problem found, reading fields left to right.
    pub fn parse(line: &str) -> Result<Self, RecordError> {
        let mut tokens = line.split_ascii_whitespace();

        let tag_token = tokens.next().ok_or(RecordError::MissingField("kind"))?;
        let tag: i64 = tag_token.parse().map_err(|_| RecordError::BadInteger {
            field: "kind",
            value: tag_token.to_string(),
        })?;
        let kind = EntityKind::from_tag(tag).ok_or(RecordError::UnknownKind(tag))?;

        let name = unescape(tokens.next().ok_or(RecordError::MissingField("name"))?)?;
        let x = parse_coord(tokens.next(), "x")?;
        let y = parse_coord(tokens.next(), "y")?;

        let rest: Vec<&str> = tokens.collect();
        if !rest.is_empty() {
            return Err(RecordError::TrailingData(rest.join(" ")));
        }

        Ok(Self {
            kind,
            name,
            position: IVec2::new(x, y),
        })
    }
}

fn parse_coord(token: Option<&str>, field: &'static str) -> Result<i32, RecordError> {
    let token = token.ok_or(RecordError::MissingField(field))?;
    token.parse().map_err(|_| RecordError::BadInteger {
        field,
        value: token.to_string(),
    })
}

impl From<&EntitySnapshot> for Record {
    fn from(snapshot: &EntitySnapshot) -> Self {
        Self {
            kind: snapshot.kind,
            name: snapshot.name.clone(),
            position: snapshot.position,
        }
    }
}

impl FromStr for Record {
    type Err = RecordError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        Self::parse(line)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.kind.tag(),
            escape(&self.name),
            self.position.x,
            self.position.y
        )
    }
}

// =============================================================================
// Name escaping
// =============================================================================

/// Escapes a name into a single whitespace-free token.
#[must_use]
pub fn escape(name: &str) -> String {
    if name.is_empty() {
        return EMPTY_NAME.to_string();
    }
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ' ' => out.push_str("\\s"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x0c' => out.push_str("\\f"),
            other => out.push(other),
        }
    }
    out
}

/// Reverses [`escape`].
///
/// # Errors
///
/// [`RecordError::BadEscape`] for a dangling backslash or an unknown escape.
pub fn unescape(token: &str) -> Result<String, RecordError> {
    if token == EMPTY_NAME {
        return Ok(String::new());
    }
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let decoded = match chars.next() {
            Some('\\') => '\\',
            Some('s') => ' ',
            Some('t') => '\t',
            Some('n') => '\n',
            Some('r') => '\r',
            Some('f') => '\x0c',
            _ => return Err(RecordError::BadEscape(token.to_string())),
        };
        out.push(decoded);
    }
    Ok(out)
}

// =============================================================================
// Tests
// =============================================================================
