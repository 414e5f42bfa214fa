use std::str::FromStr;

use serde_json::{Map, Value};

use crate::clock::{ClockAction, ClockControl};
use crate::stats::Primitive;

use super::errors::HubError;

const STAT_EVENT: u64 = 0;
const CLOCK_EVENT: u64 = 1;

/// A keeper's frame, shaped and validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    Stat(StatEvent),
    Clock(ClockCommand),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatEvent {
    pub player_pin: String,
    pub stat: Primitive,
    pub action: StatAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatAction {
    Add,
    Subtract,
}

impl StatAction {
    pub fn delta(&self) -> i32 {
        match self {
            StatAction::Add => 1,
            StatAction::Subtract => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockCommand {
    pub action: ClockAction,
    pub value: Option<String>,
}

impl ClockCommand {
    pub fn control(&self) -> ClockControl {
        let value = self.value.clone().unwrap_or_default();
        match self.action {
            ClockAction::Play => ClockControl::Play,
            ClockAction::Pause => ClockControl::Pause,
            ClockAction::Reset => ClockControl::Reset,
            ClockAction::Set => ClockControl::Set(value),
            ClockAction::Adjust => ClockControl::Adjust(value),
            ClockAction::PeriodChange if value == "-" => ClockControl::ChangePeriod(-1),
            ClockAction::PeriodChange => ClockControl::ChangePeriod(1),
        }
    }
}

impl GameEvent {
    /// Decodes a text frame into a generic map, then into a typed event.
    pub fn parse(frame: &str) -> Result<Self, HubError> {
        let map: Map<String, Value> = serde_json::from_str(frame)
            .map_err(|e| HubError::EventParseFailed(e.to_string()))?;
        Self::from_map(&map)
    }

    pub fn from_map(map: &Map<String, Value>) -> Result<Self, HubError> {
        match required_u64(map, "type")? {
            STAT_EVENT => parse_stat(map).map(GameEvent::Stat),
            CLOCK_EVENT => parse_clock(map).map(GameEvent::Clock),
            other => Err(HubError::EventParseFailed(format!(
                "unknown event type {other}"
            ))),
        }
    }
}

fn parse_stat(map: &Map<String, Value>) -> Result<StatEvent, HubError> {
    let player_pin = required_str(map, "player_pin")?;
    let stat = required_str(map, "stat")?;
    let stat = Primitive::from_str(stat)
        .map_err(|_| HubError::EventParseFailed(format!("unknown stat '{stat}'")))?;

    let action = match required_u64(map, "action")? {
        0 => StatAction::Add,
        1 => StatAction::Subtract,
        other => {
            return Err(HubError::EventValidationFailed(format!(
                "stat action must be 0 or 1, got {other}"
            )))
        }
    };

    Ok(StatEvent {
        player_pin: player_pin.to_string(),
        stat,
        action,
    })
}

fn parse_clock(map: &Map<String, Value>) -> Result<ClockCommand, HubError> {
    let code = required_u64(map, "action")?;
    let action = ClockAction::try_from(code).map_err(|code| {
        HubError::EventValidationFailed(format!("unknown clock action {code}"))
    })?;

    let value = match map.get("value") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            return Err(HubError::EventParseFailed(
                "field 'value' must be a string".to_string(),
            ))
        }
    };

    match (action.requires_value(), &value) {
        (true, None) => {
            return Err(HubError::EventValidationFailed(format!(
                "clock action {action} requires a value"
            )))
        }
        (false, Some(_)) => {
            return Err(HubError::EventValidationFailed(format!(
                "clock action {action} takes no value"
            )))
        }
        _ => {}
    }

    if action == ClockAction::PeriodChange && !matches!(value.as_deref(), Some("+" | "-")) {
        return Err(HubError::EventValidationFailed(
            "period change must be '+' or '-'".to_string(),
        ));
    }

    Ok(ClockCommand { action, value })
}

fn required_u64(map: &Map<String, Value>, field: &str) -> Result<u64, HubError> {
    map.get(field)
        .and_then(Value::as_u64)
        .ok_or_else(|| HubError::EventParseFailed(format!("missing integer field '{field}'")))
}

fn required_str<'a>(map: &'a Map<String, Value>, field: &str) -> Result<&'a str, HubError> {
    map.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| HubError::EventParseFailed(format!("missing string field '{field}'")))
}
