//! Append-only, per-case audit history.
//!
//! Entries are write-once. Deletion requires an explicit privilege flag and
//! is expected to be rare to nonexistent in practice; an unprivileged
//! attempt fails without side effects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aioffice_core::{ActorType, AuditEntryId, CaseId, Entity, OfficeError, OfficeResult};

/// One recorded action with before/after snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditEntryId,
    pub case_id: CaseId,
    pub actor_type: ActorType,
    /// User name or agent identifier.
    pub actor: String,
    pub action: String,
    pub before: Option<serde_json::Value>,
    pub after: Option<serde_json::Value>,
    pub recorded_at: DateTime<Utc>,
}

impl Entity for AuditEntry {
    type Id = AuditEntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// The per-case trail. Length is monotonically non-decreasing except under
/// a privileged purge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditTrail {
    entries: Vec<AuditEntry>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record an action. Infallible for the in-memory trail; callers must
    /// treat a failing durable sink as `OfficeError::AuditWrite`.
    pub fn append(
        &mut self,
        case_id: CaseId,
        actor_type: ActorType,
        actor: impl Into<String>,
        action: impl Into<String>,
        before: Option<serde_json::Value>,
        after: Option<serde_json::Value>,
    ) -> AuditEntryId {
        let entry = AuditEntry {
            id: AuditEntryId::new(),
            case_id,
            actor_type,
            actor: actor.into(),
            action: action.into(),
            before,
            after,
            recorded_at: Utc::now(),
        };
        let id = entry.id;
        self.entries.push(entry);
        id
    }

    pub fn find(&self, action: &str) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter().filter(move |e| e.action == action)
    }

    /// Remove an entry. Only a privileged caller may do this; everyone else
    /// gets a `Permission` error and the trail is untouched.
    pub fn purge(&mut self, entry_id: AuditEntryId, privileged: bool) -> OfficeResult<()> {
        if !privileged {
            return Err(OfficeError::permission(
                "audit logs cannot be deleted; they are immutable for compliance reasons",
            ));
        }
        let pos = self
            .entries
            .iter()
            .position(|e| e.id == entry_id)
            .ok_or_else(|| OfficeError::not_found("audit log entry", entry_id.to_string()))?;
        self.entries.remove(pos);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trail_with_one_entry() -> (AuditTrail, AuditEntryId) {
        let mut trail = AuditTrail::new();
        let id = trail.append(
            CaseId::new(),
            ActorType::User,
            "clerk",
            "propose",
            Some(serde_json::json!({"state": "new"})),
            Some(serde_json::json!({"state": "proposed"})),
        );
        (trail, id)
    }

    #[test]
    fn append_records_actor_and_snapshots() {
        let (trail, _) = trail_with_one_entry();
        let entry = &trail.entries()[0];
        assert_eq!(entry.action, "propose");
        assert_eq!(entry.actor, "clerk");
        assert_eq!(entry.before.as_ref().unwrap()["state"], "new");
        assert_eq!(entry.after.as_ref().unwrap()["state"], "proposed");
    }

    #[test]
    fn unprivileged_purge_fails_without_side_effects() {
        let (mut trail, id) = trail_with_one_entry();
        let err = trail.purge(id, false).unwrap_err();
        assert!(matches!(err, OfficeError::Permission(_)));
        assert_eq!(trail.len(), 1);
    }

    #[test]
    fn privileged_purge_removes_the_entry() {
        let (mut trail, id) = trail_with_one_entry();
        trail.purge(id, true).unwrap();
        assert!(trail.is_empty());
    }

    #[test]
    fn purge_of_unknown_entry_reports_not_found() {
        let (mut trail, _) = trail_with_one_entry();
        let err = trail.purge(AuditEntryId::new(), true).unwrap_err();
        assert!(matches!(err, OfficeError::NotFound { .. }));
        assert_eq!(trail.len(), 1);
    }
}
