//! Reversible board mutations.
//!
//! An optimistic update is a `Command` applied to local state before the
//! remote service confirms it; `rollback` undoes it when confirmation fails.
//! Each command captures whatever it needs to revert at `apply` time.

use super::drag::DropTarget;
use super::models::{CardId, ColumnId};
use super::state::BoardState;
use crate::errors::BoardError;

pub trait Command: Send {
    /// Apply the mutation, capturing the prior value.
    fn apply(&mut self, state: &mut BoardState) -> Result<(), BoardError>;

    /// Revert to the value captured by `apply`. A command that was never
    /// applied rolls back as a no-op.
    fn rollback(&mut self, state: &mut BoardState) -> Result<(), BoardError>;

    /// Human-readable description for logs.
    fn describe(&self) -> String;
}

#[derive(Debug, Clone, PartialEq)]
struct PriorPlacement {
    column: ColumnId,
    index: usize,
}

/// Move a card to a drop target: splice it out of the collection, retag its
/// column, and reinsert it before the target card (or at the end).
///
/// Rollback restores only the column. The card keeps the collection position
/// it was dropped at.
#[derive(Debug, Clone)]
pub struct MoveCardCommand {
    card_id: CardId,
    target: DropTarget,
    prior: Option<PriorPlacement>,
}

impl MoveCardCommand {
    pub fn new(card_id: CardId, target: DropTarget) -> Self {
        Self {
            card_id,
            target,
            prior: None,
        }
    }

    pub fn card_id(&self) -> &CardId {
        &self.card_id
    }

    pub fn target(&self) -> &DropTarget {
        &self.target
    }

    /// Column the card was in before `apply`.
    pub fn prior_column(&self) -> Option<&ColumnId> {
        self.prior.as_ref().map(|p| &p.column)
    }

    /// Collection index the card held before `apply`.
    pub fn prior_index(&self) -> Option<usize> {
        self.prior.as_ref().map(|p| p.index)
    }

    /// Whether the applied move changed the card's column.
    pub fn changes_column(&self) -> bool {
        self.prior
            .as_ref()
            .is_some_and(|p| p.column != self.target.column)
    }
}

impl Command for MoveCardCommand {
    fn apply(&mut self, state: &mut BoardState) -> Result<(), BoardError> {
        if !state.columns().contains(&self.target.column) {
            return Err(BoardError::UnknownColumn {
                column: self.target.column.to_string(),
            });
        }
        let column = state
            .card(&self.card_id)
            .map(|c| c.column.clone())
            .ok_or_else(|| BoardError::CardNotFound {
                id: self.card_id.to_string(),
            })?;
        let index = state.relocate(
            &self.card_id,
            self.target.column.clone(),
            self.target.before.as_ref(),
        )?;
        self.prior = Some(PriorPlacement { column, index });
        Ok(())
    }

    fn rollback(&mut self, state: &mut BoardState) -> Result<(), BoardError> {
        let Some(prior) = self.prior.take() else {
            return Ok(());
        };
        state.set_card_column(&self.card_id, prior.column)?;
        Ok(())
    }

    fn describe(&self) -> String {
        match &self.target.before {
            Some(before) => format!(
                "move card {} to {} before {}",
                self.card_id, self.target.column, before
            ),
            None => format!("move card {} to end of {}", self.card_id, self.target.column),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::models::{Card, ColumnSet};

    fn board() -> BoardState {
        BoardState::with_cards(
            ColumnSet::from_ids(["todo", "doing", "done"]).unwrap(),
            vec![
                Card::new("a", "todo", "A"),
                Card::new("b", "todo", "B"),
                Card::new("c", "doing", "C"),
            ],
        )
    }

    fn column_of(state: &BoardState, id: &str) -> String {
        state.card(&CardId::from(id)).unwrap().column.to_string()
    }

    #[test]
    fn test_apply_then_rollback_restores_column_only() {
        let mut state = board();
        let mut cmd = MoveCardCommand::new(
            CardId::from("a"),
            DropTarget {
                column: ColumnId::from("doing"),
                before: Some(CardId::from("c")),
            },
        );
        cmd.apply(&mut state).unwrap();
        assert_eq!(column_of(&state, "a"), "doing");
        assert_eq!(cmd.prior_column(), Some(&ColumnId::from("todo")));
        assert_eq!(cmd.prior_index(), Some(0));
        assert!(cmd.changes_column());

        cmd.rollback(&mut state).unwrap();
        assert_eq!(column_of(&state, "a"), "todo");
        // Position from the drop is kept.
        assert_eq!(state.card_index(&CardId::from("a")), Some(1));
    }

    #[test]
    fn test_apply_unknown_column_leaves_state_untouched() {
        let mut state = board();
        let mut cmd = MoveCardCommand::new(
            CardId::from("a"),
            DropTarget::append(ColumnId::from("archived")),
        );
        let err = cmd.apply(&mut state).unwrap_err();
        assert!(matches!(err, BoardError::UnknownColumn { ref column } if column == "archived"));
        assert_eq!(column_of(&state, "a"), "todo");
        assert_eq!(state.card_index(&CardId::from("a")), Some(0));
    }

    #[test]
    fn test_same_column_move_does_not_change_column() {
        let mut state = board();
        let mut cmd = MoveCardCommand::new(
            CardId::from("b"),
            DropTarget {
                column: ColumnId::from("todo"),
                before: Some(CardId::from("a")),
            },
        );
        cmd.apply(&mut state).unwrap();
        assert!(!cmd.changes_column());
        let todo: Vec<_> = state
            .cards_for_column(&ColumnId::from("todo"))
            .map(|c| c.id.as_str().to_string())
            .collect();
        assert_eq!(todo, vec!["b", "a"]);
    }

    #[test]
    fn test_rollback_without_apply_is_noop() {
        let mut state = board();
        let mut cmd = MoveCardCommand::new(CardId::from("a"), DropTarget::append(ColumnId::from("done")));
        cmd.rollback(&mut state).unwrap();
        assert_eq!(column_of(&state, "a"), "todo");
    }

    #[test]
    fn test_rollback_after_card_removed_errors() {
        let mut state = board();
        let mut cmd = MoveCardCommand::new(CardId::from("a"), DropTarget::append(ColumnId::from("done")));
        cmd.apply(&mut state).unwrap();
        state.remove_card(&CardId::from("a"));
        assert!(matches!(
            cmd.rollback(&mut state),
            Err(BoardError::CardNotFound { .. })
        ));
    }

    #[test]
    fn test_describe_mentions_target() {
        let cmd = MoveCardCommand::new(CardId::from("a"), DropTarget::append(ColumnId::from("done")));
        assert_eq!(cmd.describe(), "move card a to end of done");
    }
}
