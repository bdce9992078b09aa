//! Fermi poker game engine - entities, rules, and the phase machine.
//!
//! This module provides the core game implementation including:
//! - Entity model and process-wide id minting
//! - Turn-free betting rounds with automatic antes
//! - Range guesses with containment and closest-midpoint resolution
//! - Wall-clock phase scheduling via compare-and-set transitions
//! - Meta-game predictions and bankrupt re-entry
//! - Change events and redacted per-viewer snapshots

// Submodules
pub mod betting;
pub mod constants;
pub mod entities;
pub mod errors;
pub mod events;
pub mod metagame;
pub mod resolution;
pub mod scheduler;
pub mod state;
pub mod view;

pub use errors::{ErrorKind, GameError, GameResult};
pub use events::{Change, ChangeKind, EntityKind};
pub use state::{GameSettings, GameState, IdSeq, Payout, QuestionState, Resolution};
pub use view::{GameView, PlayerView, QuestionView};
