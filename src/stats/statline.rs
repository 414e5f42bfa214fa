use std::collections::{BTreeMap, HashMap};

use super::catalog::Blueprint;
use super::closure::StatClosure;
use super::definitions::{GameStat, Line};
use super::errors::StatlineError;
use super::models::{Side, StatlineSnapshot, TeamSnapshot, TeamsSnapshot};
use super::primitive::{Primitive, PrimitiveStatline};

/// Per-player primitives plus the team and game layers built on top of them.
///
/// Writes go through each player's own lock, so `add` only needs `&self`.
#[derive(Debug)]
pub struct GameStatline {
    closure: StatClosure,
    players: HashMap<String, PlayerEntry>,
    home: Vec<String>,
    away: Vec<String>,
}

#[derive(Debug)]
struct PlayerEntry {
    side: Side,
    primitives: PrimitiveStatline,
}

/// One side evaluated bottom-up.
struct SideLines<'a> {
    pins: &'a [String],
    players: Vec<Line>,
    team: Line,
}

impl SideLines<'_> {
    fn player(&self, pin: &str) -> Option<&Line> {
        self.pins
            .iter()
            .position(|p| p == pin)
            .map(|index| &self.players[index])
    }
}

impl GameStatline {
    pub fn new(
        home_pins: &[String],
        away_pins: &[String],
        blueprint: Blueprint,
    ) -> Result<Self, StatlineError> {
        Self::with_stats(home_pins, away_pins, blueprint.stats())
    }

    /// Builds a statline for an arbitrary set of game-level stats.
    pub fn with_stats(
        home_pins: &[String],
        away_pins: &[String],
        stats: &[&'static GameStat],
    ) -> Result<Self, StatlineError> {
        let closure = StatClosure::resolve(stats)?;

        let mut players = HashMap::new();
        for (side, pins) in [(Side::Home, home_pins), (Side::Away, away_pins)] {
            for pin in pins {
                let entry = PlayerEntry {
                    side,
                    primitives: PrimitiveStatline::new(closure.primitives()),
                };
                if players.insert(pin.clone(), entry).is_some() {
                    return Err(StatlineError::DuplicatePlayer(pin.clone()));
                }
            }
        }

        Ok(Self {
            closure,
            players,
            home: home_pins.to_vec(),
            away: away_pins.to_vec(),
        })
    }

    /// Unknown pins and untracked primitives are a no-op returning 0.
    pub fn add(&self, pin: &str, primitive: Primitive, delta: i32) -> u32 {
        self.players
            .get(pin)
            .map(|entry| entry.primitives.add(primitive, delta))
            .unwrap_or_default()
    }

    pub fn side_of(&self, pin: &str) -> Option<Side> {
        self.players.get(pin).map(|entry| entry.side)
    }

    pub fn closure(&self) -> &StatClosure {
        &self.closure
    }

    pub fn snapshot(&self) -> StatlineSnapshot {
        let home = self.evaluate_side(Side::Home);
        let away = self.evaluate_side(Side::Away);
        let game = self.evaluate_game(&home.team, &away.team);

        StatlineSnapshot {
            game_stats: game.export(|_| true),
            teams: TeamsSnapshot {
                home: Some(export_side(&home)),
                away: Some(export_side(&away)),
            },
        }
    }

    /// Only the stats that transitively depend on `primitive`: the one player,
    /// that player's side, and the game layer.
    pub fn snapshot_affected_by(&self, pin: &str, primitive: Primitive) -> StatlineSnapshot {
        let Some(side) = self.side_of(pin) else {
            return StatlineSnapshot::default();
        };
        let affected = self.closure.affected_by(primitive);

        let home = self.evaluate_side(Side::Home);
        let away = self.evaluate_side(Side::Away);
        let game = self.evaluate_game(&home.team, &away.team);
        let lines = match side {
            Side::Home => &home,
            Side::Away => &away,
        };

        let player_stats = lines
            .player(pin)
            .map(|line| line.export(|name| affected.player.contains(name)))
            .unwrap_or_default();

        let mut snapshot = StatlineSnapshot {
            game_stats: game.export(|name| affected.game.contains(name)),
            teams: TeamsSnapshot::default(),
        };
        *snapshot.teams.side_mut(side) = Some(TeamSnapshot {
            team_stats: lines.team.export(|name| affected.team.contains(name)),
            player_stats: BTreeMap::from([(pin.to_string(), player_stats)]),
        });
        snapshot
    }

    fn pins(&self, side: Side) -> &[String] {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }

    fn evaluate_side(&self, side: Side) -> SideLines<'_> {
        let pins = self.pins(side);

        let players: Vec<Line> = pins
            .iter()
            .map(|pin| {
                let mut line = Line::default();
                if let Some(entry) = self.players.get(pin) {
                    let values = entry.primitives.values();
                    for stat in self.closure.player_stats() {
                        line.insert(stat.name, stat.evaluate(&values));
                    }
                }
                line
            })
            .collect();

        let mut team = Line::default();
        for stat in self.closure.team_stats() {
            team.insert(stat.name, stat.evaluate(&players));
        }

        SideLines {
            pins,
            players,
            team,
        }
    }

    fn evaluate_game(&self, home: &Line, away: &Line) -> Line {
        let mut game = Line::default();
        for stat in self.closure.game_stats() {
            game.insert(stat.name, stat.evaluate(home, away));
        }
        game
    }
}

fn export_side(lines: &SideLines<'_>) -> TeamSnapshot {
    TeamSnapshot {
        team_stats: lines.team.export(|_| true),
        player_stats: lines
            .pins
            .iter()
            .zip(&lines.players)
            .map(|(pin, line)| (pin.clone(), line.export(|_| true)))
            .collect(),
    }
}
