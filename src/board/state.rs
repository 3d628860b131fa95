use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use super::drag::DragSession;
use super::models::{Card, CardId, CardPhase, ColumnId, ColumnSet};
use crate::errors::BoardError;

/// Cloneable handle to the board state.
///
/// Every UI entry point and every settling move goes through the same mutex.
/// Callers only lock for the duration of a synchronous closure; the guard is
/// never held across an `.await`, so a remote call in flight never blocks
/// rendering or further drags.
#[derive(Clone)]
pub struct BoardHandle {
    inner: Arc<Mutex<BoardState>>,
}

impl BoardHandle {
    pub fn new(state: BoardState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    /// Run a closure with exclusive access to the state.
    pub fn with<F, R>(&self, f: F) -> Result<R, BoardError>
    where
        F: FnOnce(&mut BoardState) -> R,
    {
        let mut guard = self.lock()?;
        Ok(f(&mut guard))
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, BoardState>, BoardError> {
        self.inner.lock().map_err(|_| BoardError::LockPoisoned)
    }
}

#[derive(Debug, Clone)]
struct InFlightMove {
    move_id: u64,
    from: ColumnId,
    to: ColumnId,
}

/// The canonical in-memory view of the board.
///
/// Collection order is display order: a column shows the cards whose
/// `column` matches, in the order they appear in `cards`. The remote service
/// converges on this view, never the other way round, until the next
/// `replace_all`.
#[derive(Debug)]
pub struct BoardState {
    columns: ColumnSet,
    cards: Vec<Card>,
    drag: Option<DragSession>,
    in_flight: HashMap<CardId, Vec<InFlightMove>>,
    epoch: u64,
    next_move_id: u64,
}

impl BoardState {
    pub fn new(columns: ColumnSet) -> Self {
        Self {
            columns,
            cards: Vec::new(),
            drag: None,
            in_flight: HashMap::new(),
            epoch: 0,
            next_move_id: 1,
        }
    }

    pub fn with_cards(columns: ColumnSet, cards: Vec<Card>) -> Self {
        let mut state = Self::new(columns);
        state.replace_all(cards);
        state
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn card(&self, id: &CardId) -> Option<&Card> {
        self.cards.iter().find(|c| &c.id == id)
    }

    pub fn card_index(&self, id: &CardId) -> Option<usize> {
        self.cards.iter().position(|c| &c.id == id)
    }

    /// Cards shown in `column`, in collection order. Linear scan; boards hold
    /// dozens of cards.
    pub fn cards_for_column<'a>(&'a self, column: &'a ColumnId) -> impl Iterator<Item = &'a Card> + 'a {
        self.cards.iter().filter(move |c| &c.column == column)
    }

    /// Owned snapshot of `cards_for_column` for renderers.
    pub fn visible_cards(&self, column: &ColumnId) -> Vec<Card> {
        self.cards_for_column(column).cloned().collect()
    }

    /// Every configured column with its cards, in configured order.
    pub fn partition(&self) -> Vec<(ColumnId, Vec<Card>)> {
        self.columns
            .ids()
            .map(|id| (id.clone(), self.visible_cards(id)))
            .collect()
    }

    /// Cards whose column is not configured. They never render in any column.
    pub fn orphaned_cards(&self) -> Vec<&Card> {
        self.cards
            .iter()
            .filter(|c| !self.columns.contains(&c.column))
            .collect()
    }

    /// Replace the whole collection after a full reload.
    ///
    /// Drops the drag session and forgets in-flight moves; a rollback for a
    /// move issued before the reload is ignored (see `epoch`).
    pub fn replace_all(&mut self, cards: Vec<Card>) {
        self.cards = cards;
        self.drag = None;
        self.in_flight.clear();
        self.epoch += 1;
        for orphan in self.orphaned_cards() {
            warn!(card_id = %orphan.id, column = %orphan.column, "card has unconfigured column; hidden from board");
        }
        debug!(epoch = self.epoch, cards = self.cards.len(), "board state replaced");
    }

    /// Reload generation. Bumped by every `replace_all`.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn append_card(&mut self, card: Card) {
        if !self.columns.contains(&card.column) {
            warn!(card_id = %card.id, column = %card.column, "card has unconfigured column; hidden from board");
        }
        self.cards.push(card);
    }

    pub fn remove_card(&mut self, id: &CardId) -> Option<Card> {
        let index = self.card_index(id)?;
        self.in_flight.remove(id);
        if self.drag.as_ref().is_some_and(|d| &d.card_id == id) {
            self.drag = None;
        }
        Some(self.cards.remove(index))
    }

    /// Set a card's column in place. Returns the previous column.
    pub fn set_card_column(&mut self, id: &CardId, column: ColumnId) -> Result<ColumnId, BoardError> {
        let card = self
            .cards
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| BoardError::CardNotFound { id: id.to_string() })?;
        Ok(std::mem::replace(&mut card.column, column))
    }

    /// Splice a card out of the collection and reinsert it, tagged with
    /// `column`, directly before `before` or at the end when `before` is
    /// `None` or no longer present. Returns the card's previous index.
    pub fn relocate(
        &mut self,
        id: &CardId,
        column: ColumnId,
        before: Option<&CardId>,
    ) -> Result<usize, BoardError> {
        let from = self
            .card_index(id)
            .ok_or_else(|| BoardError::CardNotFound { id: id.to_string() })?;
        let mut card = self.cards.remove(from);
        card.column = column;
        let insert_at = before
            .filter(|b| *b != id)
            .and_then(|b| self.card_index(b))
            .unwrap_or(self.cards.len());
        self.cards.insert(insert_at, card);
        Ok(from)
    }

    // ── Drag session ──────────────────────────────────────────────────

    pub fn drag_session(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    pub(crate) fn drag_session_mut(&mut self) -> Option<&mut DragSession> {
        self.drag.as_mut()
    }

    /// Install a new drag session, returning the one it displaces.
    pub(crate) fn replace_drag_session(&mut self, session: DragSession) -> Option<DragSession> {
        self.drag.replace(session)
    }

    pub(crate) fn take_drag_session(&mut self) -> Option<DragSession> {
        self.drag.take()
    }

    // ── In-flight moves ───────────────────────────────────────────────

    pub(crate) fn register_move(&mut self, id: &CardId, from: ColumnId, to: ColumnId) -> u64 {
        let move_id = self.next_move_id;
        self.next_move_id += 1;
        self.in_flight
            .entry(id.clone())
            .or_default()
            .push(InFlightMove { move_id, from, to });
        move_id
    }

    pub(crate) fn finish_move(&mut self, id: &CardId, move_id: u64) {
        if let Some(moves) = self.in_flight.get_mut(id) {
            moves.retain(|m| m.move_id != move_id);
            if moves.is_empty() {
                self.in_flight.remove(id);
            }
        }
    }

    /// Lifecycle phase of a card: pending while any remote status update for
    /// it is unresolved.
    pub fn card_phase(&self, id: &CardId) -> Option<CardPhase> {
        let card = self.card(id)?;
        match self.in_flight.get(id) {
            Some(moves) if !moves.is_empty() => {
                let first = &moves[0];
                let last = &moves[moves.len() - 1];
                Some(CardPhase::PendingMove {
                    from: first.from.clone(),
                    to: last.to.clone(),
                })
            }
            _ => Some(CardPhase::Settled {
                column: card.column.clone(),
            }),
        }
    }

    /// Cards with an unresolved remote status update.
    pub fn pending_moves(&self) -> Vec<(CardId, CardPhase)> {
        self.cards
            .iter()
            .filter(|c| self.in_flight.contains_key(&c.id))
            .filter_map(|c| self.card_phase(&c.id).map(|p| (c.id.clone(), p)))
            .collect()
    }
}
