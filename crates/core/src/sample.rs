use serde::{Deserialize, Serialize};

use crate::snapshot::BatterySnapshot;

/// Errors raised when building a sample from out-of-range input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SampleError {
    #[error("battery level {0} is outside 0-100")]
    LevelOutOfRange(i64),

    #[error("snapshot has no battery level")]
    UnknownLevel,
}

/// One persisted, timestamped battery observation.
///
/// Samples are immutable once built. The level is validated on construction
/// and on deserialization, so a stored history never contains a level outside
/// 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "SampleRecord")]
pub struct BatterySample {
    timestamp: i64,
    level: u8,
    is_charging: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

impl BatterySample {
    pub fn new(
        timestamp: i64,
        level: i64,
        is_charging: bool,
        temperature: Option<f32>,
    ) -> Result<Self, SampleError> {
        let level = u8::try_from(level)
            .ok()
            .filter(|l| *l <= 100)
            .ok_or(SampleError::LevelOutOfRange(level))?;

        Ok(Self {
            timestamp,
            level,
            is_charging,
            temperature,
        })
    }

    /// Build the history sample for a freshly acquired snapshot.
    pub fn from_snapshot(snapshot: &BatterySnapshot) -> Result<Self, SampleError> {
        let level = snapshot.level.ok_or(SampleError::UnknownLevel)?;
        Self::new(
            snapshot.timestamp,
            i64::from(level),
            snapshot.is_charging,
            snapshot.temperature_c,
        )
    }

    /// Milliseconds since the Unix epoch.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn is_charging(&self) -> bool {
        self.is_charging
    }

    pub fn temperature(&self) -> Option<f32> {
        self.temperature
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SampleRecord {
    timestamp: i64,
    level: i64,
    is_charging: bool,
    #[serde(default)]
    temperature: Option<f32>,
}

impl TryFrom<SampleRecord> for BatterySample {
    type Error = SampleError;

    fn try_from(record: SampleRecord) -> Result<Self, Self::Error> {
        Self::new(
            record.timestamp,
            record.level,
            record.is_charging,
            record.temperature,
        )
    }
}
