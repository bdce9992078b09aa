//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated
//! configuration. Game-level knobs land in a [`GameSettings`] handed to the
//! game manager; server-level knobs stay here.

use fermi_poker::GameSettings;
use std::net::SocketAddr;
use tokio::time::Duration;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Prometheus exporter bind address; exporter disabled when unset
    pub metrics_bind: Option<SocketAddr>,
    /// Defaults applied to every game the manager creates
    pub game: GameSettings,
    /// How often each game actor sweeps its wall-clock deadlines
    pub tick: Duration,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `metrics_bind_override` - Optional metrics address override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns an error if a set variable fails to parse
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        metrics_bind_override: Option<SocketAddr>,
    ) -> Result<Self, ConfigError> {
        // Bind address
        let bind = match bind_override {
            Some(addr) => addr,
            None => parse_env_required("SERVER_BIND")?.unwrap_or_else(|| {
                "127.0.0.1:6969"
                    .parse()
                    .expect("Default bind address is valid")
            }),
        };

        // Metrics exporter is opt-in; a set-but-garbled address is an error
        // rather than a silently missing scrape endpoint.
        let metrics_bind = match metrics_bind_override {
            Some(addr) => Some(addr),
            None => parse_env_required("METRICS_BIND")?,
        };

        // Game defaults
        let defaults = GameSettings::default();
        let game = GameSettings {
            starting_chips: parse_env_or("GAME_STARTING_CHIPS", defaults.starting_chips),
            guess_seconds: parse_env_or("GAME_GUESS_SECONDS", defaults.guess_seconds),
            reveal_hold_seconds: parse_env_or(
                "GAME_REVEAL_HOLD_SECONDS",
                defaults.reveal_hold_seconds,
            ),
            reentry_stake: parse_env_or("GAME_REENTRY_STAKE", defaults.reentry_stake),
            reentry_predictions: parse_env_or(
                "GAME_REENTRY_PREDICTIONS",
                defaults.reentry_predictions,
            ),
            min_players: parse_env_or("GAME_MIN_PLAYERS", defaults.min_players),
            max_players: parse_env_or("GAME_MAX_PLAYERS", defaults.max_players),
        };

        let tick = Duration::from_millis(parse_env_or("GAME_TICK_MILLIS", 1000));

        Ok(ServerConfig {
            bind,
            metrics_bind,
            game,
            tick,
        })
    }

    /// Validate configuration after loading
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the offending variable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.game.starting_chips == 0 {
            return Err(ConfigError::Invalid {
                var: "GAME_STARTING_CHIPS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.game.guess_seconds <= 0 {
            return Err(ConfigError::Invalid {
                var: "GAME_GUESS_SECONDS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.game.reentry_stake == 0 {
            return Err(ConfigError::Invalid {
                var: "GAME_REENTRY_STAKE".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.game.min_players < 2 {
            return Err(ConfigError::Invalid {
                var: "GAME_MIN_PLAYERS".to_string(),
                reason: "Must be at least 2".to_string(),
            });
        }

        if self.game.max_players < self.game.min_players {
            return Err(ConfigError::Invalid {
                var: "GAME_MAX_PLAYERS".to_string(),
                reason: format!("Must be at least min players ({})", self.game.min_players),
            });
        }

        // A zero-period tick would stall the deadline sweeps.
        if self.tick.is_zero() {
            return Err(ConfigError::Invalid {
                var: "GAME_TICK_MILLIS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Like [`parse_env_or`], but an unparseable value is an error instead of a
/// silent fallback. Used for the addresses, where a typo should stop startup.
fn parse_env_required<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().map(Some).map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("Could not parse {raw:?}"),
        }),
        Err(_) => Ok(None),
    }
}
