use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::{Display, EnumString};

use crate::clock::{ClockSettings, ClockTime};
use crate::stats::{Blueprint, StatlineError};

use super::errors::HubError;

pub type UserId = i64;

/// Database model for the games table, player pins already joined in
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct GameRecord {
    pub pin: String,
    pub owner_id: UserId,
    pub home_team_pin: Option<String>,
    pub away_team_pin: Option<String>,
    pub home_player_pins: Vec<String>,
    pub away_player_pins: Vec<String>,
    pub game_type: String, // "timed" or "target"
    pub period_length: i32, // seconds
    pub period_count: i32,
    pub score_target: Option<i32>,
    pub team_size: i32,
    pub blueprint: String,
    /// Users besides the owner allowed to keep
    pub keeper_ids: Vec<UserId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    Timed,
    Target,
}

/// A game that passed every check needed to host it live.
#[derive(Debug, Clone)]
pub struct LiveGame {
    pub pin: String,
    pub owner_id: UserId,
    pub allowed_keepers: HashSet<UserId>,
    pub home_team_pin: String,
    pub away_team_pin: String,
    pub home_player_pins: Vec<String>,
    pub away_player_pins: Vec<String>,
    pub game_type: GameType,
    pub period_length: ClockTime,
    pub period_count: u32,
    pub score_target: Option<u32>,
    pub team_size: u32,
    pub blueprint: Blueprint,
}

impl GameRecord {
    pub fn into_live_game(self) -> Result<LiveGame, HubError> {
        let (home_team_pin, away_team_pin) = match (self.home_team_pin, self.away_team_pin) {
            (Some(home), Some(away)) if !home.is_empty() && !away.is_empty() => (home, away),
            _ => return Err(HubError::TwoTeamsRequired),
        };

        let game_type = GameType::from_str(&self.game_type)
            .map_err(|_| HubError::InvalidGameType(self.game_type.clone()))?;

        if game_type == GameType::Timed && (self.period_length <= 0 || self.period_count <= 0) {
            return Err(HubError::InvalidPeriods(format!(
                "{} periods of {}s",
                self.period_count, self.period_length
            )));
        }

        let blueprint = Blueprint::from_str(&self.blueprint)
            .map_err(|_| StatlineError::UnknownBlueprint(self.blueprint.clone()))?;

        let mut allowed_keepers: HashSet<UserId> = self.keeper_ids.into_iter().collect();
        allowed_keepers.insert(self.owner_id);

        Ok(LiveGame {
            pin: self.pin,
            owner_id: self.owner_id,
            allowed_keepers,
            home_team_pin,
            away_team_pin,
            home_player_pins: self.home_player_pins,
            away_player_pins: self.away_player_pins,
            game_type,
            period_length: ClockTime::from_secs(self.period_length.max(0) as u32),
            period_count: self.period_count.max(0) as u32,
            score_target: self.score_target.map(|t| t.max(0) as u32),
            team_size: self.team_size.max(0) as u32,
            blueprint,
        })
    }
}

impl LiveGame {
    pub fn is_timed(&self) -> bool {
        self.game_type == GameType::Timed
    }

    pub fn clock_settings(&self) -> ClockSettings {
        ClockSettings::new(self.period_length, self.period_count)
    }
}


#[cfg(test)]
mod tests {
    use super::test_records::record;
    use super::*;

    #[test]
    fn owner_is_always_an_allowed_keeper() {
        let mut game = record("abc123", 7);
        game.keeper_ids = vec![9];
        let live = game.into_live_game().unwrap();
        assert_eq!(live.allowed_keepers, HashSet::from([7, 9]));
        assert_eq!(live.blueprint, Blueprint::GamePointsSimple);
    }

    #[test]
    fn missing_team_is_rejected() {
        let mut game = record("abc123", 7);
        game.away_team_pin = None;
        assert_eq!(game.into_live_game().unwrap_err(), HubError::TwoTeamsRequired);

        let mut game = record("abc123", 7);
        game.home_team_pin = Some(String::new());
        assert_eq!(game.into_live_game().unwrap_err(), HubError::TwoTeamsRequired);
    }

    #[test]
    fn missing_team_is_reported_before_other_problems() {
        let mut game = record("abc123", 7);
        game.home_team_pin = None;
        game.game_type = "sudden-death".to_string();
        game.blueprint = "GameEverything".to_string();
        assert_eq!(game.into_live_game().unwrap_err(), HubError::TwoTeamsRequired);
    }

    #[test]
    fn unknown_game_type_is_rejected() {
        let mut game = record("abc123", 7);
        game.game_type = "sudden-death".to_string();
        assert_eq!(
            game.into_live_game().unwrap_err(),
            HubError::InvalidGameType("sudden-death".to_string())
        );
    }

    #[test]
    fn timed_game_needs_positive_periods() {
        let mut game = record("abc123", 7);
        game.game_type = "timed".to_string();
        game.period_count = 0;
        assert!(matches!(
            game.into_live_game(),
            Err(HubError::InvalidPeriods(_))
        ));
    }

    #[test]
    fn target_game_ignores_periods() {
        let mut game = record("abc123", 7);
        game.period_length = 0;
        assert!(game.into_live_game().is_ok());
    }

    #[test]
    fn unknown_blueprint_is_rejected() {
        let mut game = record("abc123", 7);
        game.blueprint = "GameEverything".to_string();
        assert_eq!(
            game.into_live_game().unwrap_err(),
            HubError::Statline(StatlineError::UnknownBlueprint("GameEverything".to_string()))
        );
    }

    #[test]
    fn timed_game_gets_half_length_overtime() {
        let mut game = record("abc123", 7);
        game.game_type = "timed".to_string();
        let live = game.into_live_game().unwrap();
        assert!(live.is_timed());
        assert_eq!(live.clock_settings().overtime_length().to_string(), "05:00");
    }
}
