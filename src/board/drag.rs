//! Drag tracking and drop-position resolution.
//!
//! Hosts register one `DropIndicator` per insertion slot in each column (one
//! above every card plus a terminal slot at the bottom). While a card is
//! dragged, the pointer Y coordinate picks the slot, which in turn names the
//! card the dragged one will be inserted before.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::models::{Card, CardId, ColumnId};
use super::state::BoardState;
use crate::errors::BoardError;

/// Vertical distance added to a slot's top edge before comparing it with the
/// pointer.
pub const DEFAULT_INDICATOR_OFFSET_PX: f64 = 50.0;

/// Vertical extent of a drop slot in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRect {
    pub top: f64,
    pub height: f64,
}

/// An insertion slot in a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropIndicator {
    /// Card this slot sits above; `None` for the terminal slot.
    pub before: Option<CardId>,
    pub column: ColumnId,
    pub rect: IndicatorRect,
}

/// Resolved drop position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropTarget {
    pub column: ColumnId,
    /// Insert before this card; `None` appends to the end of the column.
    pub before: Option<CardId>,
}

impl DropTarget {
    pub fn append(column: ColumnId) -> Self {
        Self {
            column,
            before: None,
        }
    }
}

/// The single active drag. Owned by `BoardState`.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub card_id: CardId,
    pub origin_column: ColumnId,
    pub hovered: Option<DropTarget>,
}

/// Pick the slot for `pointer_y` among one column's indicators.
///
/// The winner is the slot with the greatest effective offset
/// (`top + offset_px`) that is not below the pointer. A pointer above every
/// slot resolves to the first one. Equal offsets keep the earlier slot.
pub fn nearest_indicator(
    indicators: &[DropIndicator],
    pointer_y: f64,
    offset_px: f64,
) -> Option<&DropIndicator> {
    let mut best: Option<(&DropIndicator, f64)> = None;
    for indicator in indicators {
        let effective = indicator.rect.top + offset_px;
        if effective > pointer_y {
            continue;
        }
        match best {
            Some((_, best_offset)) if effective <= best_offset => {}
            _ => best = Some((indicator, effective)),
        }
    }
    best.map(|(i, _)| i).or_else(|| indicators.first())
}

/// Tracks indicator geometry and drives the drag session stored in
/// `BoardState`.
#[derive(Debug, Clone)]
pub struct DragController {
    indicators: HashMap<ColumnId, Vec<DropIndicator>>,
    offset_px: f64,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new(DEFAULT_INDICATOR_OFFSET_PX)
    }
}

impl DragController {
    pub fn new(offset_px: f64) -> Self {
        Self {
            indicators: HashMap::new(),
            offset_px,
        }
    }

    pub fn offset_px(&self) -> f64 {
        self.offset_px
    }

    /// Replace the slots of one column. Indicators whose `column` differs
    /// from `column` are dropped.
    pub fn set_indicators(&mut self, column: ColumnId, indicators: Vec<DropIndicator>) {
        let indicators = indicators
            .into_iter()
            .filter(|i| i.column == column)
            .collect();
        self.indicators.insert(column, indicators);
    }

    pub fn clear_indicators(&mut self, column: &ColumnId) {
        self.indicators.remove(column);
    }

    pub fn indicators(&self, column: &ColumnId) -> &[DropIndicator] {
        self.indicators
            .get(column)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Register evenly spaced slots for a column's cards, `row_height` apart,
    /// starting at `top`. Used by hosts without a layout engine.
    pub fn layout_column(&mut self, column: &ColumnId, cards: &[Card], top: f64, row_height: f64) {
        let mut indicators: Vec<DropIndicator> = cards
            .iter()
            .enumerate()
            .map(|(i, card)| DropIndicator {
                before: Some(card.id.clone()),
                column: column.clone(),
                rect: IndicatorRect {
                    top: top + i as f64 * row_height,
                    height: 1.0,
                },
            })
            .collect();
        indicators.push(DropIndicator {
            before: None,
            column: column.clone(),
            rect: IndicatorRect {
                top: top + cards.len() as f64 * row_height,
                height: 1.0,
            },
        });
        self.indicators.insert(column.clone(), indicators);
    }

    /// Resolve the drop target for a pointer position over `column`. A column
    /// without registered slots appends.
    ///
    /// Hosts may omit the terminal slot. A pointer strictly below the last
    /// registered slot then appends rather than landing above the last card.
    pub fn resolve_target(&self, pointer_y: f64, column: &ColumnId) -> DropTarget {
        let indicators = self.indicators(column);
        let Some(indicator) = nearest_indicator(indicators, pointer_y, self.offset_px) else {
            return DropTarget::append(column.clone());
        };
        let is_last = indicators
            .last()
            .is_some_and(|last| std::ptr::eq(last, indicator));
        if is_last && pointer_y > indicator.rect.top + self.offset_px {
            return DropTarget::append(column.clone());
        }
        DropTarget {
            column: column.clone(),
            before: indicator.before.clone(),
        }
    }

    /// Start dragging `card_id`. A drag already in progress is abandoned.
    pub fn begin_drag(&self, state: &mut BoardState, card_id: &CardId) -> Result<(), BoardError> {
        let origin_column = state
            .card(card_id)
            .map(|c| c.column.clone())
            .ok_or_else(|| BoardError::CardNotFound {
                id: card_id.to_string(),
            })?;
        let session = DragSession {
            card_id: card_id.clone(),
            origin_column,
            hovered: None,
        };
        if let Some(previous) = state.replace_drag_session(session) {
            debug!(abandoned = %previous.card_id, card_id = %card_id, "drag replaced");
        } else {
            debug!(card_id = %card_id, "drag started");
        }
        Ok(())
    }

    /// Record the slot under the pointer. Returns the new target.
    pub fn update_drag_target(
        &self,
        state: &mut BoardState,
        pointer_y: f64,
        column: &ColumnId,
    ) -> Result<DropTarget, BoardError> {
        let target = self.resolve_target(pointer_y, column);
        let session = state.drag_session_mut().ok_or(BoardError::NoActiveDrag)?;
        session.hovered = Some(target.clone());
        Ok(target)
    }

    /// Clear the drag session whether or not a drop happened.
    pub fn end_drag(&self, state: &mut BoardState) -> Option<DragSession> {
        let session = state.take_drag_session();
        if let Some(s) = &session {
            debug!(card_id = %s.card_id, "drag ended");
        }
        session
    }
}
