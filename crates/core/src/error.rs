//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type OfficeResult<T> = Result<T, OfficeError>;

/// Outcome of an accumulated validation run.
///
/// Carries every violated rule, never just the first; approval is
/// all-or-nothing so the operator can fix everything in one pass.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ValidationReport {
    /// What was being validated (case reference, suggestion id, ...).
    pub subject: String,
    /// Human-readable rule violations, one per failed check.
    pub violations: Vec<String>,
}

impl ValidationReport {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            violations: Vec::new(),
        }
    }

    pub fn push(&mut self, violation: impl Into<String>) {
        self.violations.push(violation.into());
    }

    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    /// Consume the report: `Ok(())` when clean, the full report otherwise.
    pub fn into_result(self) -> OfficeResult<()> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(OfficeError::Validation(self))
        }
    }
}

impl core::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.subject, self.violations.join("; "))
    }
}

/// Domain-level error.
///
/// Keep this focused on deterministic business failures plus the few
/// recoverable infrastructure edges the engine has to surface (external
/// collaborator calls, audit persistence).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OfficeError {
    /// One or more compliance/structural rules failed. Recoverable by
    /// correcting the suggestion and retrying.
    #[error("validation failed: {0}")]
    Validation(ValidationReport),

    /// A state-machine edge that is not in the documented transition table.
    #[error("case {case} cannot '{action}' from state '{from}'")]
    InvalidTransition {
        case: String,
        from: String,
        action: String,
    },

    /// Authorization failure; fatal for the current actor.
    #[error("permission denied: {0}")]
    Permission(String),

    /// A referenced entity does not exist. Carries identifying context.
    #[error("{entity} not found: {reference}")]
    NotFound { entity: String, reference: String },

    /// Connection/timeout/bad response from a collaborator service.
    /// Recoverable; case state is guaranteed unchanged.
    #[error("external service '{service}' failed: {reason}")]
    ExternalService { service: String, reason: String },

    /// Audit history could not be persisted after a successful mutation.
    /// Never swallowed; silent loss of audit history is not acceptable.
    #[error("audit log write failed: {0}")]
    AuditWrite(String),

    /// A documented placeholder was invoked (e.g. the ZM report).
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// An identifier was invalid (parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// CSV/JSON rendering failure during an export.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl OfficeError {
    pub fn permission(msg: impl Into<String>) -> Self {
        Self::Permission(msg.into())
    }

    pub fn not_found(entity: impl Into<String>, reference: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            reference: reference.into(),
        }
    }

    pub fn external(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ExternalService {
            service: service.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Whether the caller may retry without changing anything but timing.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            OfficeError::Validation(_) | OfficeError::ExternalService { .. }
        )
    }
}
