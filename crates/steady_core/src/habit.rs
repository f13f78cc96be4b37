use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A user-declared daily habit. `completed` only reflects the current day;
/// past days survive only as the aggregate [`DayMark`] for that date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Habit {
    pub name: String,
    pub completed: bool,
}

impl Habit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            completed: false,
        }
    }
}

/// Aggregate completion outcome for one calendar day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DayTone {
    Completed,
    Partial,
}

/// Calendar marking recorded for a day on which at least one toggle occurred.
/// Days with no entry are treated as streak-breaking, not as unknown.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayMark {
    pub selected: bool,
    pub marked: bool,
    pub tone: DayTone,
}

impl DayMark {
    pub fn with_tone(tone: DayTone) -> Self {
        Self {
            selected: true,
            marked: true,
            tone,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.tone == DayTone::Completed
    }
}

/// Sparse date-keyed completion history. `NaiveDate` keys serialize as
/// `YYYY-MM-DD`, so the map round-trips through JSON unchanged.
pub type MarkHistory = BTreeMap<NaiveDate, DayMark>;
