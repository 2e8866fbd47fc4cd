/// Per-domain check state definitions
///
/// A domain moves through these states once per run. HTTPS is always tried
/// first; HTTP only follows a failed HTTPS attempt.
use std::fmt;

/// URL scheme of one robots.txt attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Https,
    Http,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Https => "https",
            Self::Http => "http",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents the current state of a domain's robots.txt check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckState {
    /// Queued, no request sent yet
    Pending,

    /// Waiting on the robots.txt request for the given scheme
    Fetching(Scheme),

    /// Body received, directives being parsed and evaluated
    Parsing,

    /// Result recorded
    Done,
}

impl CheckState {
    /// Returns true if the state may legally follow this one
    ///
    /// `Pending → Done` covers domains skipped by cancellation; a fetch may
    /// end in `Done` directly on a missing robots.txt or a final failure.
    pub fn can_transition_to(&self, next: CheckState) -> bool {
        use CheckState::*;

        matches!(
            (self, next),
            (Pending, Fetching(Scheme::Https))
                | (Pending, Done)
                | (Fetching(Scheme::Https), Fetching(Scheme::Http))
                | (Fetching(_), Parsing)
                | (Fetching(_), Done)
                | (Parsing, Done)
        )
    }

    /// Returns true once the result is recorded
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching(Scheme::Https) => "fetching_https",
            Self::Fetching(Scheme::Http) => "fetching_http",
            Self::Parsing => "parsing",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CheckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tracks one domain through the check state machine
#[derive(Debug)]
pub(crate) struct StateTracker {
    state: CheckState,
}

impl StateTracker {
    pub(crate) fn new() -> Self {
        Self {
            state: CheckState::Pending,
        }
    }

    pub(crate) fn state(&self) -> CheckState {
        self.state
    }

    /// Moves to `next`, logging transitions the state machine does not allow
    pub(crate) fn advance(&mut self, next: CheckState) {
        if !self.state.can_transition_to(next) {
            tracing::warn!(from = %self.state, to = %next, "Unexpected check state transition");
            debug_assert!(false, "invalid transition {} -> {}", self.state, next);
        }
        tracing::trace!(from = %self.state, to = %next, "Check state transition");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_https_first() {
        assert!(CheckState::Pending.can_transition_to(CheckState::Fetching(Scheme::Https)));
        assert!(!CheckState::Pending.can_transition_to(CheckState::Fetching(Scheme::Http)));
        assert!(!CheckState::Pending.can_transition_to(CheckState::Parsing));
    }

    #[test]
    fn test_https_falls_back_to_http_only() {
        let https = CheckState::Fetching(Scheme::Https);
        let http = CheckState::Fetching(Scheme::Http);
        assert!(https.can_transition_to(http));
        assert!(!http.can_transition_to(https));
        assert!(!http.can_transition_to(http));
    }

    #[test]
    fn test_fetching_leads_to_parsing_or_done() {
        for scheme in [Scheme::Https, Scheme::Http] {
            let fetching = CheckState::Fetching(scheme);
            assert!(fetching.can_transition_to(CheckState::Parsing));
            assert!(fetching.can_transition_to(CheckState::Done));
        }
    }

    #[test]
    fn test_done_is_terminal() {
        assert!(CheckState::Done.is_terminal());
        assert!(!CheckState::Parsing.is_terminal());
        assert!(CheckState::Parsing.can_transition_to(CheckState::Done));
        assert!(!CheckState::Done.can_transition_to(CheckState::Pending));
        assert!(!CheckState::Done.can_transition_to(CheckState::Parsing));
    }

    #[test]
    fn test_tracker_follows_fallback_path() {
        let mut tracker = StateTracker::new();
        tracker.advance(CheckState::Fetching(Scheme::Https));
        tracker.advance(CheckState::Fetching(Scheme::Http));
        tracker.advance(CheckState::Parsing);
        tracker.advance(CheckState::Done);
        assert!(tracker.state().is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(CheckState::Fetching(Scheme::Http).to_string(), "fetching_http");
        assert_eq!(Scheme::Https.to_string(), "https");
    }
}
