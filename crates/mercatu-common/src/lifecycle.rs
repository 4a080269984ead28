//! Request and proposal lifecycle rules.
//!
//! A service request moves `open → in_progress → completed`, with
//! `cancelled` reachable from `open` and `in_progress`. A proposal is
//! decided exactly once: `pending → accepted` or `pending → rejected`.
//! Accepting a proposal rejects every other pending proposal on the same
//! request and moves the request to `in_progress`. Once a request reaches
//! a terminal state its proposals are frozen.
//!
//! The functions here only validate. Applying a transition is the store's
//! job, inside its write lock, so that validation and mutation happen
//! against the same snapshot.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Request status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl RequestStatus {
    /// Terminal states accept no further transitions of any kind.
    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Cancelled)
    }

    /// The full transition map for a request.
    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        use RequestStatus::*;
        matches!(
            (self, next),
            (Open, InProgress) | (Open, Cancelled) | (InProgress, Completed) | (InProgress, Cancelled)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Open => "open",
            RequestStatus::InProgress => "in_progress",
            RequestStatus::Completed => "completed",
            RequestStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(RequestStatus::Open),
            "in_progress" => Ok(RequestStatus::InProgress),
            "completed" => Ok(RequestStatus::Completed),
            "cancelled" => Ok(RequestStatus::Cancelled),
            _ => Err(format!("Unknown request status: {}", s)),
        }
    }
}

// ---------------------------------------------------------------------------
// Proposal status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ProposalStatus {
    /// Accepted and rejected proposals never change again.
    pub fn is_decided(self) -> bool {
        !matches!(self, ProposalStatus::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Accepted => "accepted",
            ProposalStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProposalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ProposalStatus::Pending),
            "accepted" => Ok(ProposalStatus::Accepted),
            "rejected" => Ok(ProposalStatus::Rejected),
            _ => Err(format!("Unknown proposal status: {}", s)),
        }
    }
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

/// A decision on a pending proposal. `pending` is not a decision, so this
/// type cannot express it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalDecision {
    Accept,
    Reject,
}

impl ProposalDecision {
    /// The status a proposal lands in when this decision applies.
    pub fn target(self) -> ProposalStatus {
        match self {
            ProposalDecision::Accept => ProposalStatus::Accepted,
            ProposalDecision::Reject => ProposalStatus::Rejected,
        }
    }

    /// Map a requested target status to a decision. `pending` has no
    /// decision and yields `None`.
    pub fn from_target(target: ProposalStatus) -> Option<Self> {
        match target {
            ProposalStatus::Accepted => Some(ProposalDecision::Accept),
            ProposalStatus::Rejected => Some(ProposalDecision::Reject),
            ProposalStatus::Pending => None,
        }
    }
}

/// Why a lifecycle change was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("request is {0}, proposals can no longer change")]
    RequestClosed(RequestStatus),

    #[error("request is {0}, only open requests take new proposals")]
    RequestNotOpen(RequestStatus),

    #[error("proposal is already {0}")]
    AlreadyDecided(ProposalStatus),

    #[error("request cannot move from {from} to {to}")]
    IllegalMove { from: RequestStatus, to: RequestStatus },
}

/// Check that a request in `status` accepts a new proposal.
pub fn validate_submission(status: RequestStatus) -> Result<(), TransitionError> {
    if status == RequestStatus::Open {
        Ok(())
    } else {
        Err(TransitionError::RequestNotOpen(status))
    }
}

/// Check that `decision` may be applied to a proposal in `proposal_status`
/// on a request in `request_status`.
///
/// Order matters: a terminal request freezes everything, so it is reported
/// before the proposal's own state. An accepted request (`in_progress`)
/// has already rejected its other proposals, which is why a late accept
/// surfaces as [`TransitionError::AlreadyDecided`].
pub fn validate_decision(
    request_status: RequestStatus,
    proposal_status: ProposalStatus,
    decision: ProposalDecision,
) -> Result<(), TransitionError> {
    if request_status.is_terminal() {
        return Err(TransitionError::RequestClosed(request_status));
    }
    if proposal_status.is_decided() {
        return Err(TransitionError::AlreadyDecided(proposal_status));
    }
    if decision == ProposalDecision::Accept && request_status != RequestStatus::Open {
        return Err(TransitionError::RequestNotOpen(request_status));
    }
    Ok(())
}

/// Check a direct status move on a request (owner edits, cancellation,
/// marking work complete).
pub fn validate_request_move(from: RequestStatus, to: RequestStatus) -> Result<(), TransitionError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(TransitionError::IllegalMove { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_transition_map() {
        use RequestStatus::*;
        assert!(Open.can_transition_to(InProgress));
        assert!(Open.can_transition_to(Cancelled));
        assert!(InProgress.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Cancelled));

        assert!(!Open.can_transition_to(Completed));
        assert!(!InProgress.can_transition_to(Open));
        assert!(!Completed.can_transition_to(Open));
        assert!(!Cancelled.can_transition_to(InProgress));
        assert!(!Open.can_transition_to(Open));
    }

    #[test]
    fn test_terminal_states_freeze_proposals() {
        for status in [RequestStatus::Completed, RequestStatus::Cancelled] {
            let err = validate_decision(status, ProposalStatus::Pending, ProposalDecision::Reject);
            assert_eq!(err, Err(TransitionError::RequestClosed(status)));
        }
    }

    #[test]
    fn test_accept_requires_open_request() {
        let err = validate_decision(
            RequestStatus::InProgress,
            ProposalStatus::Pending,
            ProposalDecision::Accept,
        );
        assert_eq!(err, Err(TransitionError::RequestNotOpen(RequestStatus::InProgress)));
    }

    #[test]
    fn test_decided_proposals_are_final() {
        // The double-accept case: after the first accept the loser is
        // rejected, so a second accept hits the decided check.
        let err = validate_decision(
            RequestStatus::InProgress,
            ProposalStatus::Rejected,
            ProposalDecision::Accept,
        );
        assert_eq!(err, Err(TransitionError::AlreadyDecided(ProposalStatus::Rejected)));

        let err = validate_decision(
            RequestStatus::Open,
            ProposalStatus::Accepted,
            ProposalDecision::Reject,
        );
        assert_eq!(err, Err(TransitionError::AlreadyDecided(ProposalStatus::Accepted)));
    }

    #[test]
    fn test_open_request_takes_decisions() {
        assert!(validate_decision(RequestStatus::Open, ProposalStatus::Pending, ProposalDecision::Accept).is_ok());
        assert!(validate_decision(RequestStatus::Open, ProposalStatus::Pending, ProposalDecision::Reject).is_ok());
    }

    #[test]
    fn test_submission_only_while_open() {
        assert!(validate_submission(RequestStatus::Open).is_ok());
        for status in [RequestStatus::InProgress, RequestStatus::Completed, RequestStatus::Cancelled] {
            assert_eq!(validate_submission(status), Err(TransitionError::RequestNotOpen(status)));
        }
    }

    #[test]
    fn test_pending_is_not_a_decision() {
        assert_eq!(ProposalDecision::from_target(ProposalStatus::Pending), None);
        assert_eq!(
            ProposalDecision::from_target(ProposalStatus::Accepted),
            Some(ProposalDecision::Accept)
        );
    }

    #[test]
    fn test_status_string_round_trip() {
        for status in [
            RequestStatus::Open,
            RequestStatus::InProgress,
            RequestStatus::Completed,
            RequestStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<RequestStatus>(), Ok(status));
        }
        assert!("paused".parse::<RequestStatus>().is_err());
    }
}
