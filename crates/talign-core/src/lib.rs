//! Core domain model for truth alignment: truth/mirror records, patches, staff lookup.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const CRATE_NAME: &str = "talign-core";

/// One client row as computed fresh from the replica views on every run.
/// Never persisted by this service; identity is the (case-normalized) email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruthRecord {
    pub email: String,
    pub outstanding_sessions: i32,
    pub total_purchased: i32,
    /// Free-text trainer name from the scheduling view; resolved to a staff
    /// UUID later, or null when no exact match exists.
    pub coach_name: Option<String>,
    pub sessions_last_7d: i32,
    pub sessions_last_30d: i32,
    pub sessions_last_90d: i32,
    pub last_session_at: Option<DateTime<Utc>>,
}

/// Projection of a primary-database contact in the "customer" lifecycle stage.
/// Count columns are nullable upstream; a null compares as divergent from any
/// concrete truth value and gets filled in by the next patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorRecord {
    pub id: Uuid,
    pub email: String,
    pub outstanding_sessions: Option<i32>,
    pub coach_id: Option<Uuid>,
    pub sessions_last_7d: Option<i32>,
    pub sessions_last_30d: Option<i32>,
    pub sessions_last_90d: Option<i32>,
    pub last_paid_session_at: Option<DateTime<Utc>>,
}

/// Full replacement field set for one divergent mirror row. Always carries every
/// compared field, never a sparse update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorPatch {
    pub contact_id: Uuid,
    pub outstanding_sessions: i32,
    pub coach_id: Option<Uuid>,
    pub sessions_last_7d: i32,
    pub sessions_last_30d: i32,
    pub sessions_last_90d: i32,
    pub last_paid_session_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Normalized coach full name -> staff UUID, loaded once per run and read-only
/// within it. Lookups are exact-after-normalization; no fuzzy matching.
#[derive(Debug, Clone, Default)]
pub struct StaffDirectory {
    by_name: HashMap<String, Uuid>,
}

impl StaffDirectory {
    pub fn from_entries(entries: impl IntoIterator<Item = (String, Uuid)>) -> Self {
        let by_name = entries
            .into_iter()
            .map(|(name, id)| (normalize_name(&name), id))
            .collect();
        Self { by_name }
    }

    /// Resolve a free-text coach name to a staff UUID. A missing or unknown
    /// name yields `None` (explicit "unknown coach"), never an error.
    pub fn resolve(&self, coach_name: Option<&str>) -> Option<Uuid> {
        let name = coach_name?;
        let normalized = normalize_name(name);
        if normalized.is_empty() {
            return None;
        }
        self.by_name.get(&normalized).copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Emails are matched case-insensitively across the two databases.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Negative counts are not expected from the source query (it filters `>= 0`)
/// but are clamped rather than propagated into the mirror.
pub fn clamp_sessions(count: i64) -> i32 {
    count.clamp(0, i64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staff_lookup_is_exact_after_normalization() {
        let jane = Uuid::new_v4();
        let dir = StaffDirectory::from_entries([("Jane Doe".to_string(), jane)]);

        assert_eq!(dir.resolve(Some("jane doe")), Some(jane));
        assert_eq!(dir.resolve(Some("  JANE DOE ")), Some(jane));
        assert_eq!(dir.resolve(Some("Jane D.")), None);
        assert_eq!(dir.resolve(Some("")), None);
        assert_eq!(dir.resolve(None), None);
    }

    #[test]
    fn staff_lookup_is_deterministic() {
        let jane = Uuid::new_v4();
        let dir = StaffDirectory::from_entries([("Jane Doe".to_string(), jane)]);
        for _ in 0..3 {
            assert_eq!(dir.resolve(Some("Jane Doe")), Some(jane));
        }
    }

    #[test]
    fn negative_counts_clamp_to_zero() {
        assert_eq!(clamp_sessions(-3), 0);
        assert_eq!(clamp_sessions(0), 0);
        assert_eq!(clamp_sessions(42), 42);
        assert_eq!(clamp_sessions(i64::from(i32::MAX) + 1), i32::MAX);
    }

    #[test]
    fn email_normalization_trims_and_lowercases() {
        assert_eq!(normalize_email("  A@X.Com "), "a@x.com");
    }
}
