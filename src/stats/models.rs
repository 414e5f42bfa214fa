use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use super::definitions::StatValue;

pub type StatMap = BTreeMap<String, StatValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

/// Serializable view of the statline, as sent to watchers.
///
/// Partial snapshots leave out the side that was not touched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatlineSnapshot {
    pub game_stats: StatMap,
    pub teams: TeamsSnapshot,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamsSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<TeamSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away: Option<TeamSnapshot>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamSnapshot {
    pub team_stats: StatMap,
    /// Player pin -> player stats
    pub player_stats: BTreeMap<String, StatMap>,
}

impl TeamsSnapshot {
    pub fn side(&self, side: Side) -> Option<&TeamSnapshot> {
        match side {
            Side::Home => self.home.as_ref(),
            Side::Away => self.away.as_ref(),
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut Option<TeamSnapshot> {
        match side {
            Side::Home => &mut self.home,
            Side::Away => &mut self.away,
        }
    }
}
