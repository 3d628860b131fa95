//! Optimistic Kanban board core.
//!
//! ## Module Map
//!
//! | Module       | Role                                                          |
//! |--------------|---------------------------------------------------------------|
//! | `models`     | Cards, column ids, the configured column set                  |
//! | `state`      | `BoardState` (canonical card collection) and `BoardHandle`    |
//! | `drag`       | Drop slots, pointer-to-slot resolution, drag session driving  |
//! | `command`    | Reversible mutations (`Command`, `MoveCardCommand`)           |
//! | `transition` | Optimistic column moves: apply now, settle or roll back later |
//! | `remote`     | `BoardRemote` trait with HTTP and in-memory implementations   |
//! | `notify`     | Advisory notifications and board events                       |
//! | `controller` | UI entry points tying the above together                      |

pub mod command;
pub mod controller;
pub mod drag;
pub mod models;
pub mod notify;
pub mod remote;
pub mod state;
pub mod transition;

pub use controller::{BoardController, DropOutcome};
pub use drag::{DragController, DropIndicator, DropTarget, IndicatorRect};
pub use models::{Card, CardId, CardPhase, Column, ColumnId, ColumnSet, NewCard};
pub use notify::{BoardEvent, Notification, NotificationLevel, Notifier};
pub use remote::{BoardRemote, HttpBoardRemote, InMemoryRemote};
pub use state::{BoardHandle, BoardState};
pub use transition::{MoveOutcome, PendingMove, StatusTransitionApplier};
