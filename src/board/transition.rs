//! Optimistic column moves with rollback.
//!
//! A move is split in two so the local effect is observable before the
//! network settles:
//!
//! 1. `StatusTransitionApplier::begin_move` applies a `MoveCardCommand` to the
//!    board synchronously. A same-column drop stops here.
//! 2. `PendingMove::settle` sends the status update and, on any remote
//!    failure, rolls the card's column back to the captured prior value.
//!
//! There is no retry, timeout, or request sequencing. Two overlapping moves
//! of the same card settle independently; whichever fails last decides the
//! final column. A full reload or a deletion of the card between apply and
//! settle wins over a late rollback.

use tracing::{info, warn};

use super::command::{Command, MoveCardCommand};
use super::drag::DropTarget;
use super::models::{CardId, ColumnId};
use super::notify::{BoardEvent, Notification, Notifier};
use super::remote::BoardRemote;
use super::state::BoardHandle;
use crate::errors::BoardError;

/// Result of applying a drop locally.
#[derive(Debug)]
pub enum Applied {
    /// Dropped onto itself; nothing changed.
    Unchanged,
    /// Same-column reorder. Local only.
    Reordered { card_id: CardId, column: ColumnId },
    /// Column changed; the remote update still has to be settled.
    Moving(PendingMove),
}

/// How a column move settled.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    Confirmed,
    RolledBack { error: String },
    /// The remote call failed but the board was reloaded, or the card
    /// removed, meanwhile; the stale rollback was dropped.
    Superseded { error: String },
    /// The board lock was poisoned; local state was left as is.
    Unsettled { error: String },
}

#[derive(Clone)]
pub struct StatusTransitionApplier {
    board: BoardHandle,
}

impl StatusTransitionApplier {
    pub fn new(board: BoardHandle) -> Self {
        Self { board }
    }

    /// Apply a drop to local state.
    ///
    /// Fails closed: an unknown card or column leaves the board untouched.
    pub fn begin_move(&self, card_id: &CardId, target: DropTarget) -> Result<Applied, BoardError> {
        if target.before.as_ref() == Some(card_id) {
            return Ok(Applied::Unchanged);
        }

        let mut command = MoveCardCommand::new(card_id.clone(), target);
        let mut state = self.board.lock()?;
        command.apply(&mut state)?;

        let to = command.target().column.clone();
        let Some(from) = command.prior_column().cloned() else {
            return Ok(Applied::Unchanged);
        };
        if from == to {
            info!(card_id = %card_id, column = %to, "card reordered");
            return Ok(Applied::Reordered {
                card_id: card_id.clone(),
                column: to,
            });
        }

        let move_id = state.register_move(card_id, from.clone(), to.clone());
        let epoch = state.epoch();
        drop(state);

        info!(card_id = %card_id, from = %from, to = %to, "card moved optimistically");
        Ok(Applied::Moving(PendingMove {
            board: self.board.clone(),
            command,
            card_id: card_id.clone(),
            from,
            to,
            move_id,
            epoch,
        }))
    }
}

/// A column move applied locally and awaiting remote confirmation.
pub struct PendingMove {
    board: BoardHandle,
    command: MoveCardCommand,
    card_id: CardId,
    from: ColumnId,
    to: ColumnId,
    move_id: u64,
    epoch: u64,
}

impl std::fmt::Debug for PendingMove {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingMove")
            .field("card_id", &self.card_id)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("move_id", &self.move_id)
            .finish()
    }
}

impl PendingMove {
    pub fn card_id(&self) -> &CardId {
        &self.card_id
    }

    pub fn from(&self) -> &ColumnId {
        &self.from
    }

    pub fn to(&self) -> &ColumnId {
        &self.to
    }

    pub fn describe(&self) -> String {
        self.command.describe()
    }

    /// Issue the remote status update and settle the move.
    pub async fn settle(mut self, remote: &dyn BoardRemote, notifier: &dyn Notifier) -> MoveOutcome {
        let result = remote.update_card_status(&self.card_id, &self.to).await;

        let mut state = match self.board.lock() {
            Ok(state) => state,
            Err(e) => {
                warn!(card_id = %self.card_id, error = %e, "cannot settle move");
                return MoveOutcome::Unsettled {
                    error: e.to_string(),
                };
            }
        };
        state.finish_move(&self.card_id, self.move_id);

        match result {
            Ok(()) => {
                drop(state);
                info!(card_id = %self.card_id, column = %self.to, "move confirmed");
                notifier.event(&BoardEvent::MoveConfirmed {
                    card_id: self.card_id.clone(),
                    column: self.to.clone(),
                });
                notifier.notify(Notification::success("Task moved successfully"));
                MoveOutcome::Confirmed
            }
            Err(remote_err) => {
                let error = remote_err.to_string();
                if state.epoch() != self.epoch {
                    drop(state);
                    warn!(card_id = %self.card_id, error = %error, "move failed after reload; keeping reloaded state");
                    notifier.notify(Notification::error("Failed to move task"));
                    return MoveOutcome::Superseded { error };
                }

                if let Err(e) = self.command.rollback(&mut state) {
                    drop(state);
                    warn!(card_id = %self.card_id, error = %error, rollback_error = %e, "move failed; nothing to roll back");
                    notifier.notify(Notification::error("Failed to move task"));
                    return MoveOutcome::Superseded { error };
                }
                drop(state);
                warn!(
                    card_id = %self.card_id,
                    attempted = %self.to,
                    restored = %self.from,
                    error = %error,
                    "move failed; rolled back"
                );
                notifier.event(&BoardEvent::MoveReverted {
                    card_id: self.card_id.clone(),
                    attempted: self.to.clone(),
                    restored: self.from.clone(),
                    error: error.clone(),
                });
                notifier.notify(Notification::error("Failed to move task"));
                MoveOutcome::RolledBack { error }
            }
        }
    }
}
