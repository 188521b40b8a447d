//! Page lifecycle within a crawl
//!
//! Every page moves `Pending -> Fetching -> Extracting -> Done`, or to
//! `Failed` from any non-terminal state.

use crate::ScrapeError;
use serde::Serialize;
use std::fmt;

/// Represents the current state of a page in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageState {
    /// Taken from the frontier, not yet requested
    Pending,

    /// Request in flight through the fetch chain
    Fetching,

    /// Body received; decoding, parsing and extraction under way
    Extracting,

    /// Page fully processed
    Done,

    /// Page could not be fetched or was skipped by policy
    Failed,
}

impl PageState {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: PageState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Fetching)
                | (Self::Fetching, Self::Extracting)
                | (Self::Extracting, Self::Done)
                | (Self::Pending | Self::Fetching | Self::Extracting, Self::Failed)
        )
    }

    /// Moves to `next`, rejecting illegal transitions
    pub fn transition(self, next: PageState) -> Result<PageState, ScrapeError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ScrapeError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
