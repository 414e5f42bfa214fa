use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::primitive::{Primitive, PrimitiveValues};

/// Value of a derived stat.
///
/// Counts serialize as JSON integers, percentages as pre-formatted strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Count(i64),
    Text(String),
}

impl StatValue {
    /// Integer view used by higher layers. Text values never feed arithmetic.
    pub fn as_count(&self) -> i64 {
        match self {
            StatValue::Count(n) => *n,
            StatValue::Text(_) => 0,
        }
    }
}

impl From<i64> for StatValue {
    fn from(value: i64) -> Self {
        StatValue::Count(value)
    }
}

/// `"N/A"` for a zero denominator, `"100%"` for a perfect ratio, otherwise two decimals.
pub fn percentage(made: i64, attempts: i64) -> StatValue {
    if attempts <= 0 {
        return StatValue::Text("N/A".to_string());
    }
    if made == attempts {
        return StatValue::Text("100%".to_string());
    }
    let ratio = made as f64 * 100.0 / attempts as f64;
    StatValue::Text(format!("{:.2}%", ratio))
}

/// Evaluated stats of one layer entry (a player or a team), keyed by stat name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Line(BTreeMap<&'static str, StatValue>);

impl Line {
    pub fn insert(&mut self, name: &'static str, value: StatValue) {
        self.0.insert(name, value);
    }

    pub fn count(&self, name: &str) -> i64 {
        self.0.get(name).map(StatValue::as_count).unwrap_or_default()
    }

    /// Copies the entries accepted by `keep` into an owned, serializable map.
    pub fn export(&self, keep: impl Fn(&str) -> bool) -> BTreeMap<String, StatValue> {
        self.0
            .iter()
            .filter(|entry| keep(*entry.0))
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }
}

/// Player-layer formula over one player's primitives.
pub struct PlayerStat {
    pub name: &'static str,
    pub requires: &'static [Primitive],
    pub reduce: fn(&PlayerStat, &PrimitiveValues) -> StatValue,
}

/// Team-layer formula over the player lines of one side.
pub struct TeamStat {
    pub name: &'static str,
    pub requires: &'static [&'static PlayerStat],
    pub reduce: fn(&TeamStat, &[Line]) -> StatValue,
}

/// Game-layer formula over the home and away team lines.
pub struct GameStat {
    pub name: &'static str,
    pub requires: &'static [&'static TeamStat],
    pub reduce: fn(&GameStat, &Line, &Line) -> StatValue,
}

impl fmt::Debug for PlayerStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerStat")
            .field("name", &self.name)
            .field("requires", &self.requires)
            .finish()
    }
}

impl fmt::Debug for TeamStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let requires: Vec<&str> = self.requires.iter().map(|s| s.name).collect();
        f.debug_struct("TeamStat")
            .field("name", &self.name)
            .field("requires", &requires)
            .finish()
    }
}

impl fmt::Debug for GameStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let requires: Vec<&str> = self.requires.iter().map(|s| s.name).collect();
        f.debug_struct("GameStat")
            .field("name", &self.name)
            .field("requires", &requires)
            .finish()
    }
}

impl PlayerStat {
    pub fn evaluate(&self, values: &PrimitiveValues) -> StatValue {
        (self.reduce)(self, values)
    }
}

impl TeamStat {
    pub fn evaluate(&self, players: &[Line]) -> StatValue {
        (self.reduce)(self, players)
    }

    fn total(&self, players: &[Line], index: usize) -> i64 {
        let name = self.requires[index].name;
        players.iter().map(|line| line.count(name)).sum()
    }
}

impl GameStat {
    pub fn evaluate(&self, home: &Line, away: &Line) -> StatValue {
        (self.reduce)(self, home, away)
    }

    fn total(&self, home: &Line, away: &Line, index: usize) -> i64 {
        let name = self.requires[index].name;
        home.count(name) + away.count(name)
    }
}

/// Sum of every required primitive.
pub fn player_sum(stat: &PlayerStat, values: &PrimitiveValues) -> StatValue {
    stat.requires.iter().map(|p| values.get(*p)).sum::<i64>().into()
}

/// `requires = [made, missed]`.
pub fn player_percentage(stat: &PlayerStat, values: &PrimitiveValues) -> StatValue {
    let made = values.get(stat.requires[0]);
    let missed = values.get(stat.requires[1]);
    percentage(made, made + missed)
}

/// Sum of every required player stat across the side.
pub fn team_sum(stat: &TeamStat, players: &[Line]) -> StatValue {
    (0..stat.requires.len())
        .map(|index| stat.total(players, index))
        .sum::<i64>()
        .into()
}

/// `requires = [made, attempts]`.
pub fn team_percentage(stat: &TeamStat, players: &[Line]) -> StatValue {
    percentage(stat.total(players, 0), stat.total(players, 1))
}

/// Sum of every required team stat over both sides.
pub fn game_sum(stat: &GameStat, home: &Line, away: &Line) -> StatValue {
    (0..stat.requires.len())
        .map(|index| stat.total(home, away, index))
        .sum::<i64>()
        .into()
}

/// `requires = [made, attempts]`, pooled over both sides.
pub fn game_percentage(stat: &GameStat, home: &Line, away: &Line) -> StatValue {
    percentage(stat.total(home, away, 0), stat.total(home, away, 1))
}

/// Home minus away of the single required team stat.
pub fn game_margin(stat: &GameStat, home: &Line, away: &Line) -> StatValue {
    let name = stat.requires[0].name;
    (home.count(name) - away.count(name)).into()
}
