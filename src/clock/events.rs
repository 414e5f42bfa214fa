use strum_macros::{Display, EnumIter};

/// Events the clock emits on its output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[repr(u8)]
pub enum ClockEventKind {
    Tick = 0,
    Transport = 1,
    Done = 2,
    ClockSet = 3,
    PeriodSet = 4,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockEvent {
    pub kind: ClockEventKind,
    /// `MM:SS` for time-bearing events, `p/P` for period events, empty otherwise
    pub value: String,
}

impl ClockEvent {
    pub fn new(kind: ClockEventKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Control actions accepted from keepers, numbered independently of [`ClockEventKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[repr(u8)]
pub enum ClockAction {
    Play = 0,
    Pause = 1,
    Reset = 2,
    Set = 3,
    PeriodChange = 4,
    Adjust = 5,
}

impl ClockAction {
    /// Whether the wire event must carry a non-empty `value`.
    pub fn requires_value(&self) -> bool {
        matches!(
            self,
            ClockAction::Set | ClockAction::PeriodChange | ClockAction::Adjust
        )
    }
}

impl TryFrom<u64> for ClockAction {
    type Error = u64;

    fn try_from(code: u64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ClockAction::Play),
            1 => Ok(ClockAction::Pause),
            2 => Ok(ClockAction::Reset),
            3 => Ok(ClockAction::Set),
            4 => Ok(ClockAction::PeriodChange),
            5 => Ok(ClockAction::Adjust),
            other => Err(other),
        }
    }
}

/// Commands consumed by the clock's control loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockControl {
    Play,
    Pause,
    Reset,
    /// Signed `MM:SS` offset, e.g. `"+00:01"`
    Adjust(String),
    /// Absolute `MM:SS`
    Set(String),
    ChangePeriod(i32),
    Close,
}

impl ClockControl {
    pub fn adjust_minute(sign: i32) -> Self {
        ClockControl::Adjust(if sign < 0 { "-01:00" } else { "+01:00" }.to_string())
    }

    pub fn adjust_second(sign: i32) -> Self {
        ClockControl::Adjust(if sign < 0 { "-00:01" } else { "+00:01" }.to_string())
    }
}
