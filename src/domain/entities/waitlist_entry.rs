use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A single email-keyed sign-up record.
///
/// `email` is always stored lowercased, so uniqueness is case-insensitive by
/// construction. `referral_code` is assigned at insert and never changes;
/// `referred_by` is write-once.
#[derive(Debug, Clone, Serialize)]
pub struct WaitlistEntry {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub referral_code: String,
    pub referred_by: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
    pub signup_path: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WaitlistEntry {
    /// Whether a referrer has already been attributed for this entry.
    pub fn has_referrer(&self) -> bool {
        self.referred_by.as_deref().is_some_and(|r| !r.is_empty())
    }
}
