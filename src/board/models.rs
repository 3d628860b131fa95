use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::BoardError;

/// Opaque card identifier assigned by the remote task service.
///
/// Remote ids may be numeric or textual; both normalize to a string so the
/// board never interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawId", into = "String")]
pub struct CardId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Num(i64),
    Text(String),
}

impl From<RawId> for CardId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Num(n) => Self(n.to_string()),
            RawId::Text(s) => Self(s),
        }
    }
}

impl From<CardId> for String {
    fn from(id: CardId) -> Self {
        id.0
    }
}

impl CardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CardId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for CardId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<i64> for CardId {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a status lane. Matches the `column` value carried by cards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnId(String);

impl ColumnId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ColumnId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ColumnId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl FromStr for ColumnId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("Column id must not be empty".to_string());
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Completion counters shown on a card (e.g. checklist items done / total).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub done: u32,
    pub total: u32,
}

/// One task row on the board.
///
/// Only `id` and `column` are interpreted by the board; the rest is display
/// payload passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    #[serde(alias = "status")]
    pub column: ColumnId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub progress: Option<Progress>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub extra: serde_json::Value,
}

impl Card {
    pub fn new(id: impl Into<CardId>, column: impl Into<ColumnId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            column: column.into(),
            title: title.into(),
            description: None,
            assignee: None,
            time: None,
            progress: None,
            extra: serde_json::Value::Null,
        }
    }
}

/// Payload for creating a card on the remote service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCard {
    #[serde(rename = "status")]
    pub column: ColumnId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
}

impl NewCard {
    pub fn new(column: impl Into<ColumnId>, title: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            title: title.into(),
            description: None,
            assignee: None,
        }
    }
}

/// A configured status lane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub title: String,
}

/// Status lanes used when no configuration overrides them.
pub const DEFAULT_COLUMNS: [(&str, &str); 8] = [
    ("assigned", "Assigned"),
    ("acknowledged", "Acknowledged"),
    ("in_progress", "In Progress"),
    ("completed", "Completed"),
    ("in_review", "In Review"),
    ("return_for_fixes", "Return for Fixes"),
    ("dropped", "Dropped"),
    ("approved", "Approved"),
];

/// The fixed, ordered set of lanes a board renders.
///
/// Columns are never created or deleted by board operations; the set comes
/// from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSet {
    columns: Vec<Column>,
}

impl ColumnSet {
    pub fn new(columns: Vec<Column>) -> Result<Self, BoardError> {
        for (i, col) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.id == col.id) {
                return Err(BoardError::DuplicateColumn {
                    column: col.id.to_string(),
                });
            }
        }
        Ok(Self { columns })
    }

    pub fn from_ids<I, S>(ids: I) -> Result<Self, BoardError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = ids
            .into_iter()
            .map(|id| {
                let id: String = id.into();
                Column {
                    title: title_from_id(&id),
                    id: ColumnId(id),
                }
            })
            .collect();
        Self::new(columns)
    }

    pub fn contains(&self, id: &ColumnId) -> bool {
        self.columns.iter().any(|c| &c.id == id)
    }

    pub fn get(&self, id: &ColumnId) -> Option<&Column> {
        self.columns.iter().find(|c| &c.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ColumnId> {
        self.columns.iter().map(|c| &c.id)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Default for ColumnSet {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS
                .iter()
                .map(|(id, title)| Column {
                    id: ColumnId::from(*id),
                    title: (*title).to_string(),
                })
                .collect(),
        }
    }
}

/// `return_for_fixes` -> `Return For Fixes`
fn title_from_id(id: &str) -> String {
    id.split(['_', '-'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Where a card sits in the optimistic-move lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CardPhase {
    Settled { column: ColumnId },
    PendingMove { from: ColumnId, to: ColumnId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_id_accepts_numeric_and_string_json() {
        let a: CardId = serde_json::from_str("42").unwrap();
        let b: CardId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"42\"");
    }

    #[test]
    fn test_card_deserializes_status_alias() {
        let card: Card =
            serde_json::from_str(r#"{"id": 7, "status": "in_review", "title": "Audit"}"#).unwrap();
        assert_eq!(card.id, CardId::from(7_i64));
        assert_eq!(card.column, ColumnId::from("in_review"));
        assert!(card.extra.is_null());
    }

    #[test]
    fn test_default_column_set_order() {
        let set = ColumnSet::default();
        let ids: Vec<&str> = set.ids().map(|c| c.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "assigned",
                "acknowledged",
                "in_progress",
                "completed",
                "in_review",
                "return_for_fixes",
                "dropped",
                "approved"
            ]
        );
    }

    #[test]
    fn test_column_set_rejects_duplicates() {
        let err = ColumnSet::from_ids(["todo", "done", "todo"]).unwrap_err();
        assert!(matches!(err, BoardError::DuplicateColumn { ref column } if column == "todo"));
    }

    #[test]
    fn test_column_titles_derived_from_ids() {
        let set = ColumnSet::from_ids(["return_for_fixes", "done"]).unwrap();
        let col = set.get(&ColumnId::from("return_for_fixes")).unwrap();
        assert_eq!(col.title, "Return For Fixes");
    }

    #[test]
    fn test_column_id_from_str_rejects_blank() {
        assert!("  ".parse::<ColumnId>().is_err());
        assert_eq!("done".parse::<ColumnId>().unwrap(), ColumnId::from("done"));
    }
}
