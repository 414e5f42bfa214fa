use std::fmt;
use std::str::FromStr;

use super::errors::ClockError;

/// Whole seconds left on the game clock, rendered as zero-padded `MM:SS`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u32);

impl ClockTime {
    pub const ZERO: ClockTime = ClockTime(0);

    pub fn from_secs(secs: u32) -> Self {
        Self(secs)
    }

    pub fn from_minutes(minutes: u32) -> Self {
        Self(minutes.saturating_mul(60))
    }

    pub fn as_secs(&self) -> u32 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Applies a signed offset, clamping at zero.
    pub fn offset(self, secs: i64) -> Self {
        let next = (self.0 as i64 + secs).clamp(0, u32::MAX as i64);
        Self(next as u32)
    }

    pub fn half(self) -> Self {
        Self(self.0 / 2)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for ClockTime {
    type Err = ClockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ClockError::InvalidDuration(s.to_string());

        let (minutes, seconds) = s.split_once(':').ok_or_else(invalid)?;
        if minutes.is_empty()
            || seconds.is_empty()
            || !minutes.bytes().all(|b| b.is_ascii_digit())
            || !seconds.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
        let seconds: u32 = seconds.parse().map_err(|_| invalid())?;
        if seconds >= 60 {
            return Err(invalid());
        }

        minutes
            .checked_mul(60)
            .and_then(|m| m.checked_add(seconds))
            .map(ClockTime)
            .ok_or_else(invalid)
    }
}

/// Parses an adjustment such as `"+00:10"`, `"-01:00"` or `"00:05"` into signed seconds.
pub fn parse_offset(s: &str) -> Result<i64, ClockError> {
    let (sign, rest) = match s.as_bytes().first() {
        Some(b'+') => (1, &s[1..]),
        Some(b'-') => (-1, &s[1..]),
        _ => (1, s),
    };
    let time: ClockTime = rest
        .parse()
        .map_err(|_| ClockError::InvalidDuration(s.to_string()))?;
    Ok(sign * time.as_secs() as i64)
}
