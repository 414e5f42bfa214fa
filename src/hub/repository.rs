use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::errors::HubError;
use super::models::{GameRecord, UserId};

/// Lookup of games that can be hosted live
#[async_trait]
pub trait GameRepository {
    /// Finds the game `pin` owned by `user_id`.
    async fn find_game(&self, pin: &str, user_id: UserId) -> Result<Option<GameRecord>, HubError>;
}

/// In-memory implementation of GameRepository for development and testing
pub struct InMemoryGameRepository {
    games: Mutex<HashMap<String, GameRecord>>,
}

impl Default for InMemoryGameRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGameRepository {
    pub fn new() -> Self {
        Self {
            games: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert(&self, game: GameRecord) {
        debug!(game_pin = %game.pin, owner_id = game.owner_id, "Storing game in memory");
        self.games
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(game.pin.clone(), game);
    }
}

#[async_trait]
impl GameRepository for InMemoryGameRepository {
    #[instrument(skip(self))]
    async fn find_game(&self, pin: &str, user_id: UserId) -> Result<Option<GameRecord>, HubError> {
        let games = self
            .games
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let game = games
            .get(pin)
            .filter(|game| game.owner_id == user_id)
            .cloned();

        match &game {
            Some(_) => debug!(game_pin = %pin, "Game found in memory"),
            None => debug!(game_pin = %pin, user_id, "Game not found in memory"),
        }
        Ok(game)
    }
}

pub struct PostgresGameRepository {
    pool: PgPool,
}

impl PostgresGameRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GameRepository for PostgresGameRepository {
    #[instrument(skip(self))]
    async fn find_game(&self, pin: &str, user_id: UserId) -> Result<Option<GameRecord>, HubError> {
        debug!(game_pin = %pin, "Fetching game from database");

        let row = sqlx::query(
            "SELECT g.pin, g.owner_id, g.home_team_pin, g.away_team_pin, g.game_type, \
                    g.period_length, g.period_count, g.score_target, g.team_size, g.blueprint, \
                    COALESCE(g.keeper_ids, '{}') AS keeper_ids, \
                    COALESCE((SELECT array_agg(p.pin ORDER BY p.pin) FROM players p \
                              WHERE p.team_pin = g.home_team_pin), '{}') AS home_player_pins, \
                    COALESCE((SELECT array_agg(p.pin ORDER BY p.pin) FROM players p \
                              WHERE p.team_pin = g.away_team_pin), '{}') AS away_player_pins \
             FROM games g WHERE g.pin = $1 AND g.owner_id = $2",
        )
        .bind(pin)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, game_pin = %pin, "Failed to fetch game from database");
            HubError::Database(e.to_string())
        })?;

        let game = match row {
            Some(row) => {
                let game = GameRecord {
                    pin: row.get("pin"),
                    owner_id: row.get("owner_id"),
                    home_team_pin: row.get("home_team_pin"),
                    away_team_pin: row.get("away_team_pin"),
                    home_player_pins: row.get("home_player_pins"),
                    away_player_pins: row.get("away_player_pins"),
                    game_type: row.get("game_type"),
                    period_length: row.get("period_length"),
                    period_count: row.get("period_count"),
                    score_target: row.get("score_target"),
                    team_size: row.get("team_size"),
                    blueprint: row.get("blueprint"),
                    keeper_ids: row.get("keeper_ids"),
                };
                debug!(game_pin = %pin, "Game found in database");
                Some(game)
            }
            None => {
                debug!(game_pin = %pin, user_id, "Game not found in database");
                None
            }
        };

        Ok(game)
    }
}
