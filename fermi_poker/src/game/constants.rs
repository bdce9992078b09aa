//! Game-wide constants.

/// Hard cap on players per game. Fermi poker is a party game; past this
/// the guessing phase turns into crowd noise.
pub const MAX_PLAYERS: usize = 12;

/// Minimum players required before the host can start a game.
pub const MIN_PLAYERS_TO_START: usize = 2;

/// Cap on user-provided text inputs (display names, question text, hints).
pub const MAX_USER_INPUT_LENGTH: usize = 256;

/// Wall-clock length of the guessing phase.
pub const GUESSING_PHASE_SECS: i64 = 60;

/// How long a resolved question stays on final reveal before the game
/// moves on.
pub const REVEAL_HOLD_SECS: i64 = 15;

/// Correct winner predictions required before a bankrupt player may
/// re-enter the game.
pub const REENTRY_PREDICTIONS: u32 = 3;

/// Number of open betting rounds per question.
pub const BETTING_ROUNDS: u8 = 3;

/// Ledger round number reserved for automatic antes. Keeping antes out of
/// rounds 1..=3 lets every open round start with a highest bet of zero.
pub const ANTE_ROUND: u8 = 0;
