//! Actor runtime - one task per game and a manager to route to them.
//!
//! Game state is single-owner: a [`GameActor`] holds it and replays inbox
//! messages one at a time. The [`GameManager`] spawns actors, maps question
//! and player ids back to their game, and exposes typed async operations
//! that round-trip over the inbox.

pub mod actor;
pub mod manager;
pub mod messages;

pub use actor::{GameActor, GameHandle};
pub use manager::{DEFAULT_TICK, GameManager};
pub use messages::GameMessage;
