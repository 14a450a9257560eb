//! Lifecycle policies selected at startup from `LifecycleConfig`.

use std::str::FromStr;

use crate::core::error::{AppError, Result};
use crate::features::reports::models::ReportStatus;

/// Which status changes an admin may request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransitionPolicy {
    /// Any status other than the current one
    #[default]
    Permissive,
    /// pending -> {in_progress, resolved, rejected}, in_progress -> {resolved, rejected};
    /// resolved and rejected are terminal
    Strict,
}

impl TransitionPolicy {
    pub fn check(&self, from: ReportStatus, to: ReportStatus) -> Result<()> {
        if from == to {
            return Err(AppError::Validation(format!("Report is already {}", to)));
        }

        if *self == TransitionPolicy::Strict {
            use ReportStatus::*;
            let allowed = matches!(
                (from, to),
                (Pending, InProgress | Resolved | Rejected) | (InProgress, Resolved | Rejected)
            );
            if !allowed {
                return Err(AppError::Validation(format!(
                    "Transition from {} to {} is not allowed",
                    from, to
                )));
            }
        }

        Ok(())
    }
}

impl FromStr for TransitionPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permissive" => Ok(Self::Permissive),
            "strict" => Ok(Self::Strict),
            other => Err(format!(
                "LIFECYCLE_TRANSITION_POLICY must be 'permissive' or 'strict', got '{}'",
                other
            )),
        }
    }
}

/// What `assign` does when the report already has a live assignment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReassignmentPolicy {
    /// Fail with `Conflict`
    #[default]
    Reject,
    /// Complete the live assignment in the same unit of work, then create the new one
    Supersede,
}

impl FromStr for ReassignmentPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "supersede" => Ok(Self::Supersede),
            other => Err(format!(
                "LIFECYCLE_REASSIGNMENT_POLICY must be 'reject' or 'supersede', got '{}'",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ReportStatus::*;

    const ALL: [ReportStatus; 4] = [Pending, InProgress, Resolved, Rejected];

    #[test]
    fn test_permissive_accepts_everything_but_noops() {
        for from in ALL {
            for to in ALL {
                let result = TransitionPolicy::Permissive.check(from, to);
                assert_eq!(result.is_ok(), from != to, "{} -> {}", from, to);
            }
        }
    }

    #[test]
    fn test_strict_graph() {
        let strict = TransitionPolicy::Strict;
        assert!(strict.check(Pending, InProgress).is_ok());
        assert!(strict.check(Pending, Rejected).is_ok());
        assert!(strict.check(InProgress, Resolved).is_ok());
        assert!(strict.check(InProgress, Pending).is_err());
        assert!(strict.check(Resolved, Pending).is_err());
        assert!(strict.check(Rejected, InProgress).is_err());
        assert!(matches!(
            strict.check(Resolved, Resolved),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_policies() {
        assert_eq!(
            "STRICT".parse::<TransitionPolicy>().unwrap(),
            TransitionPolicy::Strict
        );
        assert_eq!(
            " supersede ".parse::<ReassignmentPolicy>().unwrap(),
            ReassignmentPolicy::Supersede
        );
        assert!("lenient".parse::<TransitionPolicy>().is_err());
        assert!("ignore".parse::<ReassignmentPolicy>().is_err());
    }
}
