//! # Fermi Poker
//!
//! A game engine for Fermi poker: players wager chips on numeric range
//! estimates for order-of-magnitude questions, with progressive hints and
//! poker-style betting between them.
//!
//! Each question moves through a fixed sequence of phases:
//!
//! - **NotStarted**: Queued behind the current question
//! - **GuessingPhase**: Players commit a `[lower, upper]` range under a
//!   wall-clock deadline
//! - **BettingRound1/2/3**: Turn-free check/call/raise/fold rounds, one
//!   hint revealed at the top of each
//! - **FinalReveal**: The answer comes out and the pot settles on the
//!   narrowest containing range, or the closest midpoint when nobody
//!   trapped the answer
//!
//! The optional meta-game lets players predict each question's winner;
//! three correct calls let a bankrupt player buy back in.
//!
//! ## Core Modules
//!
//! - [`game`]: Entities, betting rules, resolution, phase scheduling
//! - [`table`]: Per-game actors and the manager that routes to them
//!
//! ## Example
//!
//! ```
//! use chrono::Utc;
//! use fermi_poker::{GameSettings, GameState, IdSeq};
//!
//! let mut game = GameState::create(true, GameSettings::default(), IdSeq::new(), Utc::now());
//! let question = game
//!     .add_question("How many piano tuners work in Chicago?", 290, 10, 1, vec![])
//!     .unwrap();
//! assert_eq!(question.order_num, 1);
//! ```

/// Core game logic, entities, and phase machine.
pub mod game;
pub use game::{
    ErrorKind, GameError, GameResult, GameSettings, GameState, GameView, IdSeq, Resolution,
    constants::{self, MAX_PLAYERS, MIN_PLAYERS_TO_START},
    entities::{self, DEFAULT_ANTE, DEFAULT_REENTRY_STAKE, DEFAULT_STARTING_CHIPS},
    events::{Change, ChangeKind, EntityKind},
};

/// Actor runtime for serialized, concurrent game access.
pub mod table;
pub use table::{GameActor, GameHandle, GameManager, GameMessage};
