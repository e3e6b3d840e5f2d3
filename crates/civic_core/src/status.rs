use crate::schema::{Status, Timestamp};
use serde::Deserialize;
use time::PrimitiveDateTime;

/// Keyword lists that override the time-based status.
///
/// Matching is a case-insensitive substring test against the meeting's
/// combined text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusCues {
    #[serde(default = "default_cancelled")]
    pub cancelled: Vec<String>,
    #[serde(default = "default_tentative")]
    pub tentative: Vec<String>,
}

impl Default for StatusCues {
    fn default() -> Self {
        Self {
            cancelled: default_cancelled(),
            tentative: default_tentative(),
        }
    }
}

fn default_cancelled() -> Vec<String> {
    ["cancel", "postpone", "rescheduled"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_tentative() -> Vec<String> {
    ["may change", "subject to change", "proposed", "tentative"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

impl StatusCues {
    pub(crate) fn normalized(self) -> Self {
        fn clean(list: Vec<String>) -> Vec<String> {
            list.into_iter()
                .map(|cue| cue.trim().to_lowercase())
                .filter(|cue| !cue.is_empty())
                .collect()
        }
        Self {
            cancelled: clean(self.cancelled),
            tentative: clean(self.tentative),
        }
    }
}

/// Cancellation cues win over tentative cues, which win over the clock. A
/// meeting starting exactly at `now` has not passed.
pub fn classify(start: Timestamp, now: PrimitiveDateTime, cue_text: &str, cues: &StatusCues) -> Status {
    let lowered = cue_text.to_lowercase();
    let hit = |list: &[String]| list.iter().any(|cue| !cue.is_empty() && lowered.contains(cue.as_str()));

    if hit(&cues.cancelled) {
        Status::Cancelled
    } else if hit(&cues.tentative) {
        Status::Tentative
    } else if start.get() < now {
        Status::Passed
    } else {
        Status::Confirmed
    }
}

pub fn cue_text(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}
