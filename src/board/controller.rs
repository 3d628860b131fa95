use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::drag::{DragController, DropIndicator, DropTarget};
use super::models::{Card, CardId, CardPhase, ColumnId, ColumnSet, NewCard};
use super::notify::{BoardEvent, Notification, Notifier};
use super::remote::BoardRemote;
use super::state::{BoardHandle, BoardState};
use super::transition::{Applied, MoveOutcome, PendingMove, StatusTransitionApplier};
use crate::errors::BoardError;

/// Result of `on_drop`.
#[derive(Debug)]
pub enum DropOutcome {
    /// No drag was active, nothing was hovered, or the card landed where it was.
    Ignored,
    /// Reordered within its column; no remote call.
    Reordered { card_id: CardId, column: ColumnId },
    /// Column changed locally; settle the returned move to persist it.
    Moving(PendingMove),
}

/// UI-facing entry points for one board.
///
/// Owns the board state, the drop-slot geometry, the remote service and the
/// notification sink. Cheap to clone; clones share everything.
#[derive(Clone)]
pub struct BoardController {
    board: BoardHandle,
    drag: Arc<Mutex<DragController>>,
    applier: StatusTransitionApplier,
    remote: Arc<dyn BoardRemote>,
    notifier: Arc<dyn Notifier>,
}

impl BoardController {
    pub fn new(
        columns: ColumnSet,
        drag: DragController,
        remote: Arc<dyn BoardRemote>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let board = BoardHandle::new(BoardState::new(columns));
        Self {
            applier: StatusTransitionApplier::new(board.clone()),
            board,
            drag: Arc::new(Mutex::new(drag)),
            remote,
            notifier,
        }
    }

    pub fn board(&self) -> &BoardHandle {
        &self.board
    }

    fn with_drag<R>(&self, f: impl FnOnce(&mut DragController) -> R) -> Result<R, BoardError> {
        let mut drag = self.drag.lock().map_err(|_| BoardError::LockPoisoned)?;
        Ok(f(&mut drag))
    }

    // ── Slot geometry ─────────────────────────────────────────────────

    pub fn drag_offset_px(&self) -> Result<f64, BoardError> {
        self.with_drag(|d| d.offset_px())
    }

    pub fn set_indicators(&self, column: ColumnId, indicators: Vec<DropIndicator>) -> Result<(), BoardError> {
        self.with_drag(|d| d.set_indicators(column, indicators))
    }

    /// Lay out evenly spaced slots for every column from the current cards.
    pub fn layout_columns(&self, top: f64, row_height: f64) -> Result<(), BoardError> {
        let partition = self.board.with(|s| s.partition())?;
        self.with_drag(|d| {
            for (column, cards) in &partition {
                d.layout_column(column, cards, top, row_height);
            }
        })
    }

    // ── Drag events ───────────────────────────────────────────────────

    pub fn on_drag_start(&self, card_id: &CardId) -> Result<(), BoardError> {
        let drag = self.drag.lock().map_err(|_| BoardError::LockPoisoned)?;
        let mut state = self.board.lock()?;
        drag.begin_drag(&mut state, card_id)
    }

    /// Track the pointer over `column`. Returns `None` when no drag is active.
    pub fn on_drag_over(&self, pointer_y: f64, column: &ColumnId) -> Result<Option<DropTarget>, BoardError> {
        let drag = self.drag.lock().map_err(|_| BoardError::LockPoisoned)?;
        let mut state = self.board.lock()?;
        match drag.update_drag_target(&mut state, pointer_y, column) {
            Ok(target) => Ok(Some(target)),
            Err(BoardError::NoActiveDrag) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Drop the dragged card on `column`.
    ///
    /// The target is the slot last hovered in `column`, or the end of the
    /// column when the pointer never hovered it. The drag session is left for
    /// `on_drag_end` to clear.
    pub fn on_drop(&self, column: &ColumnId) -> Result<DropOutcome, BoardError> {
        let session = self.board.with(|s| s.drag_session().cloned())?;
        let Some(session) = session else {
            debug!(column = %column, "drop without active drag");
            return Ok(DropOutcome::Ignored);
        };

        let target = match session.hovered {
            Some(t) if &t.column == column => t,
            _ => DropTarget::append(column.clone()),
        };

        match self.applier.begin_move(&session.card_id, target.clone())? {
            Applied::Unchanged => Ok(DropOutcome::Ignored),
            Applied::Reordered { card_id, column } => {
                self.notifier.event(&BoardEvent::CardReordered {
                    card_id: card_id.clone(),
                    column: column.clone(),
                    before: target.before,
                });
                Ok(DropOutcome::Reordered { card_id, column })
            }
            Applied::Moving(pending) => {
                self.notifier.event(&BoardEvent::CardMoved {
                    card_id: pending.card_id().clone(),
                    from_column: pending.from().clone(),
                    to_column: pending.to().clone(),
                });
                Ok(DropOutcome::Moving(pending))
            }
        }
    }

    /// Settle a pending move against this controller's remote and notifier.
    pub async fn settle(&self, pending: PendingMove) -> MoveOutcome {
        pending
            .settle(self.remote.as_ref(), self.notifier.as_ref())
            .await
    }

    /// `on_drop` with the remote update running on a background task.
    pub fn on_drop_spawned(&self, column: &ColumnId) -> Result<Option<JoinHandle<MoveOutcome>>, BoardError> {
        match self.on_drop(column)? {
            DropOutcome::Moving(pending) => {
                let controller = self.clone();
                Ok(Some(tokio::spawn(async move {
                    controller.settle(pending).await
                })))
            }
            DropOutcome::Ignored | DropOutcome::Reordered { .. } => Ok(None),
        }
    }

    pub fn on_drag_end(&self) -> Result<(), BoardError> {
        let drag = self.drag.lock().map_err(|_| BoardError::LockPoisoned)?;
        let mut state = self.board.lock()?;
        drag.end_drag(&mut state);
        Ok(())
    }

    // ── Read side ─────────────────────────────────────────────────────

    pub fn visible_cards(&self, column: &ColumnId) -> Result<Vec<Card>, BoardError> {
        self.board.with(|s| s.visible_cards(column))
    }

    pub fn partition(&self) -> Result<Vec<(ColumnId, Vec<Card>)>, BoardError> {
        self.board.with(|s| s.partition())
    }

    pub fn orphaned_cards(&self) -> Result<Vec<Card>, BoardError> {
        self.board
            .with(|s| s.orphaned_cards().into_iter().cloned().collect())
    }

    pub fn card_phase(&self, card_id: &CardId) -> Result<Option<CardPhase>, BoardError> {
        self.board.with(|s| s.card_phase(card_id))
    }

    // ── Remote-backed operations ──────────────────────────────────────

    /// Replace local state with the remote's full card list.
    pub async fn reload(&self) -> Result<usize, BoardError> {
        let cards = match self.remote.fetch_all_cards().await {
            Ok(cards) => cards,
            Err(e) => {
                warn!(error = %e, "reload failed");
                self.notifier.notify(Notification::error("Failed to load tasks"));
                return Err(e.into());
            }
        };
        let (count, orphaned) = self.board.with(|s| {
            s.replace_all(cards);
            (s.len(), s.orphaned_cards().len())
        })?;
        info!(cards = count, orphaned, "board reloaded");
        self.notifier.event(&BoardEvent::BoardReloaded {
            card_count: count,
            orphaned,
        });
        Ok(count)
    }

    /// Create on the remote, then append locally.
    pub async fn create_card(&self, card: NewCard) -> Result<Card, BoardError> {
        let columns_ok = self.board.with(|s| s.columns().contains(&card.column))?;
        if !columns_ok {
            return Err(BoardError::UnknownColumn {
                column: card.column.to_string(),
            });
        }
        let created = match self.remote.create_card(&card).await {
            Ok(c) => c,
            Err(e) => {
                self.notifier.notify(Notification::error("Failed to create task"));
                return Err(e.into());
            }
        };
        self.board.with(|s| s.append_card(created.clone()))?;
        info!(card_id = %created.id, column = %created.column, "card created");
        self.notifier.event(&BoardEvent::CardCreated {
            card: created.clone(),
        });
        self.notifier.notify(Notification::success("Task created"));
        Ok(created)
    }

    /// Delete on the remote, then remove locally. The card stays visible until
    /// the remote confirms.
    pub async fn delete_card(&self, card_id: &CardId) -> Result<(), BoardError> {
        let exists = self.board.with(|s| s.card(card_id).is_some())?;
        if !exists {
            return Err(BoardError::CardNotFound {
                id: card_id.to_string(),
            });
        }
        if let Err(e) = self.remote.delete_card(card_id).await {
            self.notifier.notify(Notification::error("Failed to delete task"));
            return Err(e.into());
        }
        self.board.with(|s| s.remove_card(card_id))?;
        info!(card_id = %card_id, "card deleted");
        self.notifier.event(&BoardEvent::CardDeleted {
            card_id: card_id.clone(),
        });
        self.notifier.notify(Notification::success("Task deleted"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::drag::IndicatorRect;
    use crate::board::notify::RecordingNotifier;
    use crate::board::remote::InMemoryRemote;

    fn seed() -> Vec<Card> {
        vec![
            Card::new("t1", "assigned", "Write brief"),
            Card::new("t2", "assigned", "Call supplier"),
            Card::new("t3", "in_progress", "Quote"),
        ]
    }

    async fn controller() -> (BoardController, Arc<InMemoryRemote>, Arc<RecordingNotifier>) {
        let remote = Arc::new(InMemoryRemote::new(seed()));
        let notifier = Arc::new(RecordingNotifier::new());
        let ctl = BoardController::new(
            ColumnSet::default(),
            DragController::default(),
            remote.clone(),
            notifier.clone(),
        );
        ctl.reload().await.unwrap();
        (ctl, remote, notifier)
    }

    fn ids(cards: &[Card]) -> Vec<String> {
        cards.iter().map(|c| c.id.to_string()).collect()
    }

    #[tokio::test]
    async fn test_drop_without_drag_is_ignored() {
        let (ctl, _, _) = controller().await;
        let outcome = ctl.on_drop(&ColumnId::from("completed")).unwrap();
        assert!(matches!(outcome, DropOutcome::Ignored));
        assert_eq!(ctl.on_drag_over(10.0, &ColumnId::from("completed")).unwrap(), None);
    }

    #[tokio::test]
    async fn test_full_drag_cycle_uses_hovered_slot() {
        let (ctl, remote, notifier) = controller().await;
        let in_progress = ColumnId::from("in_progress");
        ctl.set_indicators(
            in_progress.clone(),
            vec![
                DropIndicator {
                    before: Some(CardId::from("t3")),
                    column: in_progress.clone(),
                    rect: IndicatorRect { top: 0.0, height: 2.0 },
                },
                DropIndicator {
                    before: None,
                    column: in_progress.clone(),
                    rect: IndicatorRect { top: 100.0, height: 2.0 },
                },
            ],
        )
        .unwrap();

        ctl.on_drag_start(&CardId::from("t1")).unwrap();
        let target = ctl.on_drag_over(60.0, &in_progress).unwrap().unwrap();
        assert_eq!(target.before, Some(CardId::from("t3")));

        let DropOutcome::Moving(pending) = ctl.on_drop(&in_progress).unwrap() else {
            panic!("expected a pending move");
        };
        ctl.on_drag_end().unwrap();
        assert_eq!(ids(&ctl.visible_cards(&in_progress).unwrap()), vec!["t1", "t3"]);

        assert_eq!(ctl.settle(pending).await, MoveOutcome::Confirmed);
        assert_eq!(remote.status_calls(), vec![(CardId::from("t1"), in_progress.clone())]);
        assert!(
            notifier
                .events()
                .iter()
                .any(|e| matches!(e, BoardEvent::CardMoved { .. }))
        );
    }

    #[tokio::test]
    async fn test_same_column_drop_reorders_without_remote_call() {
        let (ctl, remote, notifier) = controller().await;
        let assigned = ColumnId::from("assigned");
        ctl.layout_columns(0.0, 100.0).unwrap();

        ctl.on_drag_start(&CardId::from("t2")).unwrap();
        let target = ctl.on_drag_over(50.0, &assigned).unwrap().unwrap();
        assert_eq!(target.before, Some(CardId::from("t1")));
        let outcome = ctl.on_drop(&assigned).unwrap();
        ctl.on_drag_end().unwrap();

        assert!(matches!(outcome, DropOutcome::Reordered { .. }));
        assert_eq!(ids(&ctl.visible_cards(&assigned).unwrap()), vec!["t2", "t1"]);
        assert_eq!(
            ctl.card_phase(&CardId::from("t2")).unwrap(),
            Some(CardPhase::Settled {
                column: assigned.clone()
            })
        );
        assert!(remote.status_calls().is_empty());
        assert!(
            notifier
                .events()
                .iter()
                .any(|e| matches!(e, BoardEvent::CardReordered { .. }))
        );
    }

    #[tokio::test]
    async fn test_hover_over_other_column_falls_back_to_append() {
        let (ctl, _, _) = controller().await;
        ctl.layout_columns(0.0, 40.0).unwrap();
        ctl.on_drag_start(&CardId::from("t3")).unwrap();
        ctl.on_drag_over(0.0, &ColumnId::from("in_progress")).unwrap();

        let DropOutcome::Moving(pending) = ctl.on_drop(&ColumnId::from("assigned")).unwrap() else {
            panic!("expected a pending move");
        };
        assert_eq!(pending.to(), &ColumnId::from("assigned"));
        assert_eq!(
            ids(&ctl.visible_cards(&ColumnId::from("assigned")).unwrap()),
            vec!["t1", "t2", "t3"]
        );
    }

    #[tokio::test]
    async fn test_spawned_drop_is_visible_while_in_flight() {
        let (ctl, remote, _) = controller().await;
        remote.hold_updates();

        ctl.on_drag_start(&CardId::from("t2")).unwrap();
        let handle = ctl
            .on_drop_spawned(&ColumnId::from("completed"))
            .unwrap()
            .unwrap();
        ctl.on_drag_end().unwrap();

        assert_eq!(
            ids(&ctl.visible_cards(&ColumnId::from("completed")).unwrap()),
            vec!["t2"]
        );
        assert!(matches!(
            ctl.card_phase(&CardId::from("t2")).unwrap(),
            Some(CardPhase::PendingMove { .. })
        ));

        remote.release_updates(1);
        assert_eq!(handle.await.unwrap(), MoveOutcome::Confirmed);
        assert_eq!(
            ctl.card_phase(&CardId::from("t2")).unwrap(),
            Some(CardPhase::Settled {
                column: ColumnId::from("completed")
            })
        );
    }

    #[tokio::test]
    async fn test_reload_rederives_partition_and_drops_optimistic_state() {
        let (ctl, remote, _) = controller().await;
        remote.hold_updates();
        ctl.on_drag_start(&CardId::from("t1")).unwrap();
        let DropOutcome::Moving(_pending) = ctl.on_drop(&ColumnId::from("approved")).unwrap() else {
            panic!("expected a pending move");
        };

        ctl.reload().await.unwrap();
        ctl.reload().await.unwrap();

        let source = remote.stored_cards();
        for (column, cards) in ctl.partition().unwrap() {
            let expected: Vec<Card> = source
                .iter()
                .filter(|c| c.column == column)
                .cloned()
                .collect();
            assert_eq!(cards, expected, "column {column}");
        }
        assert!(ctl.board().with(|s| s.pending_moves().is_empty()).unwrap());
        assert!(ctl.board().with(|s| s.drag_session().is_none()).unwrap());
    }

    #[tokio::test]
    async fn test_create_appends_after_remote_success() {
        let (ctl, remote, _) = controller().await;
        let card = ctl
            .create_card(NewCard::new("assigned", "New lead"))
            .await
            .unwrap();
        let assigned = ctl.visible_cards(&ColumnId::from("assigned")).unwrap();
        assert_eq!(assigned.last().unwrap().id, card.id);
        assert_eq!(remote.stored_cards().len(), 4);
    }

    #[tokio::test]
    async fn test_create_in_unknown_column_rejected_locally() {
        let (ctl, remote, _) = controller().await;
        let err = ctl
            .create_card(NewCard::new("archive", "Nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::UnknownColumn { .. }));
        assert_eq!(remote.stored_cards().len(), 3);
    }

    #[tokio::test]
    async fn test_delete_removes_after_remote_success() {
        let (ctl, _, _) = controller().await;
        ctl.delete_card(&CardId::from("t1")).await.unwrap();
        assert_eq!(
            ids(&ctl.visible_cards(&ColumnId::from("assigned")).unwrap()),
            vec!["t2"]
        );
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_card() {
        let (ctl, remote, notifier) = controller().await;
        remote.delete_card(&CardId::from("t1")).await.unwrap();
        let err = ctl.delete_card(&CardId::from("t1")).await.unwrap_err();
        assert!(matches!(err, BoardError::Remote(_)));
        assert_eq!(
            ids(&ctl.visible_cards(&ColumnId::from("assigned")).unwrap()),
            vec!["t1", "t2"]
        );
        assert_eq!(notifier.notifications().last().unwrap().message, "Failed to delete task");
    }
}
