use strum_macros::{Display, EnumIter, EnumString};

use super::definitions::{
    game_margin, game_percentage, game_sum, percentage, player_percentage, player_sum,
    team_percentage, team_sum, GameStat, PlayerStat, StatValue, TeamStat,
};
use super::primitive::{Primitive, PrimitiveValues};

use Primitive::*;

// ============================================================================
// Player layer
// ============================================================================

pub static PLAYER_PTS_SIMPLE: PlayerStat = PlayerStat {
    name: "Pts",
    requires: &[PtsSimple],
    reduce: player_sum,
};

pub static PLAYER_PTS: PlayerStat = PlayerStat {
    name: "Pts",
    requires: &[TwoPtM, ThreePtM, FreeThrowM],
    reduce: player_points,
};

pub static PLAYER_2PT_MADE: PlayerStat = PlayerStat {
    name: "2PtM",
    requires: &[TwoPtM],
    reduce: player_sum,
};

pub static PLAYER_2PT_ATTEMPTS: PlayerStat = PlayerStat {
    name: "2PtAtt",
    requires: &[TwoPtM, TwoPtA],
    reduce: player_sum,
};

pub static PLAYER_2PT_PCT: PlayerStat = PlayerStat {
    name: "2Pt%",
    requires: &[TwoPtM, TwoPtA],
    reduce: player_percentage,
};

pub static PLAYER_3PT_MADE: PlayerStat = PlayerStat {
    name: "3PtM",
    requires: &[ThreePtM],
    reduce: player_sum,
};

pub static PLAYER_3PT_ATTEMPTS: PlayerStat = PlayerStat {
    name: "3PtAtt",
    requires: &[ThreePtM, ThreePtA],
    reduce: player_sum,
};

pub static PLAYER_3PT_PCT: PlayerStat = PlayerStat {
    name: "3Pt%",
    requires: &[ThreePtM, ThreePtA],
    reduce: player_percentage,
};

pub static PLAYER_FT_MADE: PlayerStat = PlayerStat {
    name: "FTM",
    requires: &[FreeThrowM],
    reduce: player_sum,
};

pub static PLAYER_FT_ATTEMPTS: PlayerStat = PlayerStat {
    name: "FTAtt",
    requires: &[FreeThrowM, FreeThrowA],
    reduce: player_sum,
};

pub static PLAYER_FT_PCT: PlayerStat = PlayerStat {
    name: "FT%",
    requires: &[FreeThrowM, FreeThrowA],
    reduce: player_percentage,
};

pub static PLAYER_FG_MADE: PlayerStat = PlayerStat {
    name: "FGM",
    requires: &[TwoPtM, ThreePtM],
    reduce: player_sum,
};

pub static PLAYER_FG_ATTEMPTS: PlayerStat = PlayerStat {
    name: "FGAtt",
    requires: &[TwoPtM, TwoPtA, ThreePtM, ThreePtA],
    reduce: player_sum,
};

pub static PLAYER_FG_PCT: PlayerStat = PlayerStat {
    name: "FG%",
    requires: &[TwoPtM, ThreePtM, TwoPtA, ThreePtA],
    reduce: player_field_goal_percentage,
};

pub static PLAYER_REB: PlayerStat = PlayerStat {
    name: "Reb",
    requires: &[OffensiveRebound, DefensiveRebound, Rebound],
    reduce: player_sum,
};

pub static PLAYER_OREB: PlayerStat = PlayerStat {
    name: "OReb",
    requires: &[OffensiveRebound],
    reduce: player_sum,
};

pub static PLAYER_DREB: PlayerStat = PlayerStat {
    name: "DReb",
    requires: &[DefensiveRebound],
    reduce: player_sum,
};

pub static PLAYER_AST: PlayerStat = PlayerStat {
    name: "Ast",
    requires: &[Assist],
    reduce: player_sum,
};

pub static PLAYER_BLK: PlayerStat = PlayerStat {
    name: "Blk",
    requires: &[Block],
    reduce: player_sum,
};

pub static PLAYER_STL: PlayerStat = PlayerStat {
    name: "Stl",
    requires: &[Steal],
    reduce: player_sum,
};

pub static PLAYER_TO: PlayerStat = PlayerStat {
    name: "To",
    requires: &[Turnover],
    reduce: player_sum,
};

pub static PLAYER_FL: PlayerStat = PlayerStat {
    name: "Fl",
    requires: &[Foul],
    reduce: player_sum,
};

fn player_points(_: &PlayerStat, values: &PrimitiveValues) -> StatValue {
    (2 * values.get(TwoPtM) + 3 * values.get(ThreePtM) + values.get(FreeThrowM)).into()
}

fn player_field_goal_percentage(_: &PlayerStat, values: &PrimitiveValues) -> StatValue {
    let made = values.get(TwoPtM) + values.get(ThreePtM);
    let missed = values.get(TwoPtA) + values.get(ThreePtA);
    percentage(made, made + missed)
}

// ============================================================================
// Team layer
// ============================================================================
//
// Shooting percentages read [made, attempts]; the player percentage is listed
// last so that player lines carry it too.

pub static TEAM_PTS_SIMPLE: TeamStat = TeamStat {
    name: "Pts",
    requires: &[&PLAYER_PTS_SIMPLE],
    reduce: team_sum,
};

pub static TEAM_PTS: TeamStat = TeamStat {
    name: "Pts",
    requires: &[&PLAYER_PTS],
    reduce: team_sum,
};

pub static TEAM_2PT_MADE: TeamStat = TeamStat {
    name: "2PtM",
    requires: &[&PLAYER_2PT_MADE],
    reduce: team_sum,
};

pub static TEAM_2PT_ATTEMPTS: TeamStat = TeamStat {
    name: "2PtAtt",
    requires: &[&PLAYER_2PT_ATTEMPTS],
    reduce: team_sum,
};

pub static TEAM_2PT_PCT: TeamStat = TeamStat {
    name: "2Pt%",
    requires: &[&PLAYER_2PT_MADE, &PLAYER_2PT_ATTEMPTS, &PLAYER_2PT_PCT],
    reduce: team_percentage,
};

pub static TEAM_3PT_MADE: TeamStat = TeamStat {
    name: "3PtM",
    requires: &[&PLAYER_3PT_MADE],
    reduce: team_sum,
};

pub static TEAM_3PT_ATTEMPTS: TeamStat = TeamStat {
    name: "3PtAtt",
    requires: &[&PLAYER_3PT_ATTEMPTS],
    reduce: team_sum,
};

pub static TEAM_3PT_PCT: TeamStat = TeamStat {
    name: "3Pt%",
    requires: &[&PLAYER_3PT_MADE, &PLAYER_3PT_ATTEMPTS, &PLAYER_3PT_PCT],
    reduce: team_percentage,
};

pub static TEAM_FT_MADE: TeamStat = TeamStat {
    name: "FTM",
    requires: &[&PLAYER_FT_MADE],
    reduce: team_sum,
};

pub static TEAM_FT_ATTEMPTS: TeamStat = TeamStat {
    name: "FTAtt",
    requires: &[&PLAYER_FT_ATTEMPTS],
    reduce: team_sum,
};

pub static TEAM_FT_PCT: TeamStat = TeamStat {
    name: "FT%",
    requires: &[&PLAYER_FT_MADE, &PLAYER_FT_ATTEMPTS, &PLAYER_FT_PCT],
    reduce: team_percentage,
};

pub static TEAM_FG_MADE: TeamStat = TeamStat {
    name: "FGM",
    requires: &[&PLAYER_FG_MADE],
    reduce: team_sum,
};

pub static TEAM_FG_ATTEMPTS: TeamStat = TeamStat {
    name: "FGAtt",
    requires: &[&PLAYER_FG_ATTEMPTS],
    reduce: team_sum,
};

pub static TEAM_FG_PCT: TeamStat = TeamStat {
    name: "FG%",
    requires: &[&PLAYER_FG_MADE, &PLAYER_FG_ATTEMPTS, &PLAYER_FG_PCT],
    reduce: team_percentage,
};

pub static TEAM_REB: TeamStat = TeamStat {
    name: "Reb",
    requires: &[&PLAYER_REB],
    reduce: team_sum,
};

pub static TEAM_OREB: TeamStat = TeamStat {
    name: "OReb",
    requires: &[&PLAYER_OREB],
    reduce: team_sum,
};

pub static TEAM_DREB: TeamStat = TeamStat {
    name: "DReb",
    requires: &[&PLAYER_DREB],
    reduce: team_sum,
};

pub static TEAM_AST: TeamStat = TeamStat {
    name: "Ast",
    requires: &[&PLAYER_AST],
    reduce: team_sum,
};

pub static TEAM_BLK: TeamStat = TeamStat {
    name: "Blk",
    requires: &[&PLAYER_BLK],
    reduce: team_sum,
};

pub static TEAM_STL: TeamStat = TeamStat {
    name: "Stl",
    requires: &[&PLAYER_STL],
    reduce: team_sum,
};

pub static TEAM_TO: TeamStat = TeamStat {
    name: "To",
    requires: &[&PLAYER_TO],
    reduce: team_sum,
};

pub static TEAM_FL: TeamStat = TeamStat {
    name: "Fl",
    requires: &[&PLAYER_FL],
    reduce: team_sum,
};

// ============================================================================
// Game layer
// ============================================================================

pub static GAME_PTS_SIMPLE: GameStat = GameStat {
    name: "Pts",
    requires: &[&TEAM_PTS_SIMPLE],
    reduce: game_sum,
};

pub static GAME_PTS: GameStat = GameStat {
    name: "Pts",
    requires: &[&TEAM_PTS],
    reduce: game_sum,
};

pub static GAME_MARGIN: GameStat = GameStat {
    name: "Margin",
    requires: &[&TEAM_PTS],
    reduce: game_margin,
};

pub static GAME_2PT_PCT: GameStat = GameStat {
    name: "2Pt%",
    requires: &[&TEAM_2PT_MADE, &TEAM_2PT_ATTEMPTS, &TEAM_2PT_PCT],
    reduce: game_percentage,
};

pub static GAME_3PT_PCT: GameStat = GameStat {
    name: "3Pt%",
    requires: &[&TEAM_3PT_MADE, &TEAM_3PT_ATTEMPTS, &TEAM_3PT_PCT],
    reduce: game_percentage,
};

pub static GAME_FT_PCT: GameStat = GameStat {
    name: "FT%",
    requires: &[&TEAM_FT_MADE, &TEAM_FT_ATTEMPTS, &TEAM_FT_PCT],
    reduce: game_percentage,
};

pub static GAME_FG_PCT: GameStat = GameStat {
    name: "FG%",
    requires: &[&TEAM_FG_MADE, &TEAM_FG_ATTEMPTS, &TEAM_FG_PCT],
    reduce: game_percentage,
};

pub static GAME_REB: GameStat = GameStat {
    name: "Reb",
    requires: &[&TEAM_REB],
    reduce: game_sum,
};

pub static GAME_OREB: GameStat = GameStat {
    name: "OReb",
    requires: &[&TEAM_OREB],
    reduce: game_sum,
};

pub static GAME_DREB: GameStat = GameStat {
    name: "DReb",
    requires: &[&TEAM_DREB],
    reduce: game_sum,
};

pub static GAME_AST: GameStat = GameStat {
    name: "Ast",
    requires: &[&TEAM_AST],
    reduce: game_sum,
};

pub static GAME_BLK: GameStat = GameStat {
    name: "Blk",
    requires: &[&TEAM_BLK],
    reduce: game_sum,
};

pub static GAME_STL: GameStat = GameStat {
    name: "Stl",
    requires: &[&TEAM_STL],
    reduce: game_sum,
};

pub static GAME_TO: GameStat = GameStat {
    name: "To",
    requires: &[&TEAM_TO],
    reduce: game_sum,
};

pub static GAME_FL: GameStat = GameStat {
    name: "Fl",
    requires: &[&TEAM_FL],
    reduce: game_sum,
};

// ============================================================================
// Blueprints
// ============================================================================

static POINTS_SIMPLE: &[&GameStat] = &[&GAME_PTS_SIMPLE];

static POINTS_ADVANCED: &[&GameStat] = &[
    &GAME_PTS,
    &GAME_MARGIN,
    &GAME_FG_PCT,
    &GAME_2PT_PCT,
    &GAME_3PT_PCT,
    &GAME_FT_PCT,
];

static BOX_SCORE: &[&GameStat] = &[
    &GAME_PTS,
    &GAME_MARGIN,
    &GAME_FG_PCT,
    &GAME_2PT_PCT,
    &GAME_3PT_PCT,
    &GAME_FT_PCT,
    &GAME_REB,
    &GAME_OREB,
    &GAME_DREB,
    &GAME_AST,
    &GAME_BLK,
    &GAME_STL,
    &GAME_TO,
    &GAME_FL,
];

/// Named, ordered sets of game-level stats a hub can be started with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum Blueprint {
    GamePointsSimple,
    GamePointsAdvanced,
    GameBoxScore,
}

impl Blueprint {
    pub fn stats(&self) -> &'static [&'static GameStat] {
        match self {
            Blueprint::GamePointsSimple => POINTS_SIMPLE,
            Blueprint::GamePointsAdvanced => POINTS_ADVANCED,
            Blueprint::GameBoxScore => BOX_SCORE,
        }
    }
}
