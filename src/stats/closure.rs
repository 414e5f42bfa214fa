use std::collections::{BTreeMap, BTreeSet};

use super::definitions::{GameStat, PlayerStat, TeamStat};
use super::errors::StatlineError;
use super::primitive::Primitive;

/// Every definition a blueprint needs, resolved once and addressed by name.
///
/// Each definition also records the primitives it depends on transitively,
/// which is what partial snapshots filter on.
#[derive(Debug)]
pub struct StatClosure {
    primitives: BTreeSet<Primitive>,
    player: BTreeMap<&'static str, Resolved<PlayerStat>>,
    team: BTreeMap<&'static str, Resolved<TeamStat>>,
    game: Vec<Resolved<GameStat>>,
}

#[derive(Debug)]
struct Resolved<T: 'static> {
    def: &'static T,
    primitives: BTreeSet<Primitive>,
}

/// Names of the stats, per layer, that depend on one primitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AffectedStats {
    pub player: BTreeSet<&'static str>,
    pub team: BTreeSet<&'static str>,
    pub game: BTreeSet<&'static str>,
}

impl StatClosure {
    /// Walks `blueprint` down to the primitives, deduplicating by name.
    ///
    /// The same definition reached twice is fine; two different definitions
    /// sharing a name are rejected.
    pub fn resolve(blueprint: &[&'static GameStat]) -> Result<Self, StatlineError> {
        let mut closure = StatClosure {
            primitives: BTreeSet::new(),
            player: BTreeMap::new(),
            team: BTreeMap::new(),
            game: Vec::new(),
        };

        for game_stat in blueprint {
            if let Some(existing) = closure.game.iter().find(|r| r.def.name == game_stat.name) {
                if std::ptr::eq(existing.def, *game_stat) {
                    continue;
                }
                return Err(StatlineError::ConflictingDefinition(game_stat.name));
            }

            let mut primitives = BTreeSet::new();
            for team_stat in game_stat.requires {
                primitives.extend(closure.resolve_team(team_stat)?.iter().copied());
            }
            closure.game.push(Resolved {
                def: game_stat,
                primitives,
            });
        }

        Ok(closure)
    }

    fn resolve_team(
        &mut self,
        team_stat: &'static TeamStat,
    ) -> Result<&BTreeSet<Primitive>, StatlineError> {
        if let Some(existing) = self.team.get(team_stat.name) {
            if !std::ptr::eq(existing.def, team_stat) {
                return Err(StatlineError::ConflictingDefinition(team_stat.name));
            }
        } else {
            let mut primitives = BTreeSet::new();
            for player_stat in team_stat.requires {
                primitives.extend(self.resolve_player(player_stat)?.iter().copied());
            }
            self.team.insert(
                team_stat.name,
                Resolved {
                    def: team_stat,
                    primitives,
                },
            );
        }
        Ok(&self.team[team_stat.name].primitives)
    }

    fn resolve_player(
        &mut self,
        player_stat: &'static PlayerStat,
    ) -> Result<&BTreeSet<Primitive>, StatlineError> {
        if let Some(existing) = self.player.get(player_stat.name) {
            if !std::ptr::eq(existing.def, player_stat) {
                return Err(StatlineError::ConflictingDefinition(player_stat.name));
            }
        } else {
            let primitives: BTreeSet<Primitive> = player_stat.requires.iter().copied().collect();
            self.primitives.extend(primitives.iter().copied());
            self.player.insert(
                player_stat.name,
                Resolved {
                    def: player_stat,
                    primitives,
                },
            );
        }
        Ok(&self.player[player_stat.name].primitives)
    }

    pub fn primitives(&self) -> &BTreeSet<Primitive> {
        &self.primitives
    }

    pub fn player_stats(&self) -> impl Iterator<Item = &'static PlayerStat> + '_ {
        self.player.values().map(|r| r.def)
    }

    pub fn team_stats(&self) -> impl Iterator<Item = &'static TeamStat> + '_ {
        self.team.values().map(|r| r.def)
    }

    /// Game stats in blueprint order.
    pub fn game_stats(&self) -> impl Iterator<Item = &'static GameStat> + '_ {
        self.game.iter().map(|r| r.def)
    }

    pub fn affected_by(&self, primitive: Primitive) -> AffectedStats {
        AffectedStats {
            player: names_depending_on(self.player.values(), primitive),
            team: names_depending_on(self.team.values(), primitive),
            game: self
                .game
                .iter()
                .filter(|r| r.primitives.contains(&primitive))
                .map(|r| r.def.name())
                .collect(),
        }
    }
}

fn names_depending_on<'a, T: Named + 'static>(
    resolved: impl Iterator<Item = &'a Resolved<T>>,
    primitive: Primitive,
) -> BTreeSet<&'static str> {
    resolved
        .filter(|r| r.primitives.contains(&primitive))
        .map(|r| r.def.name())
        .collect()
}

trait Named {
    fn name(&self) -> &'static str;
}

impl Named for PlayerStat {
    fn name(&self) -> &'static str {
        self.name
    }
}

impl Named for TeamStat {
    fn name(&self) -> &'static str {
        self.name
    }
}

impl Named for GameStat {
    fn name(&self) -> &'static str {
        self.name
    }
}
