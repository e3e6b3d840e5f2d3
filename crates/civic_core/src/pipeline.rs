use crate::assemble::Assembler;
use crate::error::FragmentError;
use crate::schema::Meeting;
use rayon::prelude::*;
use serde_json::Value;
use std::fmt;
use time::{OffsetDateTime, PrimitiveDateTime};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Stop the run at the first failing fragment; emit nothing.
    #[default]
    Abort,
    Skip,
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorPolicy::Abort => "abort",
            ErrorPolicy::Skip => "skip",
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub meetings: Vec<Meeting>,
    pub skipped: Vec<FragmentError>,
}

/// Local time when the offset is known, UTC otherwise.
pub fn reference_now() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    PrimitiveDateTime::new(now.date(), now.time())
}

/// Decodes and assembles every element of the fragment file in parallel,
/// keeping input order. Under [`ErrorPolicy::Abort`] the lowest-positioned
/// failure is returned.
pub fn run(
    assembler: &Assembler<'_>,
    fragments: &[Value],
    policy: ErrorPolicy,
) -> Result<RunOutcome, FragmentError> {
    let results: Vec<Result<Meeting, FragmentError>> = fragments
        .par_iter()
        .enumerate()
        .map(|(position, value)| assembler.assemble_value_at(position, value))
        .collect();

    let mut outcome = RunOutcome::default();
    for result in results {
        match result {
            Ok(meeting) => outcome.meetings.push(meeting),
            Err(err) if policy == ErrorPolicy::Abort => return Err(err),
            Err(err) => {
                warn!(position = err.position, error = %err, "skipping fragment");
                outcome.skipped.push(err);
            }
        }
    }

    info!(
        spider = %assembler.config().name,
        fragments = fragments.len(),
        emitted = outcome.meetings.len(),
        skipped = outcome.skipped.len(),
        "assembly finished"
    );
    Ok(outcome)
}
