use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use crate::{
    app_error::{AppError, AppResult},
    application::validators::is_valid_email,
    entities::waitlist_entry::WaitlistEntry,
};

#[async_trait]
pub trait WaitlistRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<WaitlistEntry>>;

    /// Inserts a new entry and assigns its referral code. Must fail with
    /// [`AppError::UniqueViolation`] when the email already exists.
    async fn insert(&self, entry: &NewWaitlistEntry) -> AppResult<WaitlistEntry>;

    async fn update_by_email(&self, email: &str, patch: &WaitlistPatch) -> AppResult<()>;
}

/// A submission as parsed off the wire: trimmed strings, empty meaning absent.
#[derive(Debug, Default, Clone)]
pub struct SignupForm {
    pub email: String,
    pub name: String,
    pub referred_by: String,
    pub utm_source: String,
    pub utm_medium: String,
    pub utm_campaign: String,
    pub utm_term: String,
    pub utm_content: String,
    pub signup_path: String,
    pub user_agent: String,
}

/// Fields captured for a first-time insert.
#[derive(Debug, Clone)]
pub struct NewWaitlistEntry {
    pub email: String,
    pub name: Option<String>,
    pub referred_by: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
    pub signup_path: Option<String>,
    pub user_agent: Option<String>,
}

/// Partial update for a repeat submission. `None` fields are left untouched,
/// so omission never clears a stored value.
#[derive(Debug, Default, Clone)]
pub struct WaitlistPatch {
    pub name: Option<String>,
    pub referred_by: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
    pub signup_path: Option<String>,
    pub user_agent: Option<String>,
}

impl WaitlistPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.referred_by.is_none()
            && self.utm_source.is_none()
            && self.utm_medium.is_none()
            && self.utm_campaign.is_none()
            && self.utm_term.is_none()
            && self.utm_content.is_none()
            && self.signup_path.is_none()
            && self.user_agent.is_none()
    }
}

#[derive(Clone)]
pub struct SignupUseCases {
    repo: Arc<dyn WaitlistRepo>,
}

impl SignupUseCases {
    pub fn new(repo: Arc<dyn WaitlistRepo>) -> Self {
        Self { repo }
    }

    /// Records a sign-up exactly once per email and returns the entry's
    /// referral code.
    ///
    /// Repeat submissions never create a second row: metadata is refreshed
    /// where a new non-empty value was supplied, `referred_by` stays whatever
    /// it was first set to, and nothing is ever cleared by omission.
    #[instrument(skip(self, form), fields(email = tracing::field::Empty))]
    pub async fn submit(&self, form: SignupForm) -> AppResult<String> {
        let email = form.email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(AppError::InvalidEmail);
        }
        tracing::Span::current().record("email", email.as_str());

        let new_entry = NewWaitlistEntry {
            email,
            name: non_empty(form.name),
            referred_by: non_empty(form.referred_by),
            utm_source: non_empty(form.utm_source),
            utm_medium: non_empty(form.utm_medium),
            utm_campaign: non_empty(form.utm_campaign),
            utm_term: non_empty(form.utm_term),
            utm_content: non_empty(form.utm_content),
            signup_path: non_empty(form.signup_path),
            user_agent: non_empty(form.user_agent),
        };

        match self.repo.find_by_email(&new_entry.email).await? {
            Some(existing) => self.refresh_existing(existing, new_entry).await,
            None => self.insert_new(new_entry).await,
        }
    }

    async fn refresh_existing(
        &self,
        existing: WaitlistEntry,
        new_entry: NewWaitlistEntry,
    ) -> AppResult<String> {
        let patch = build_patch(&existing, new_entry);
        if !patch.is_empty() {
            // The entry exists and the caller's referral code is already
            // known, so a failed metadata refresh is not worth failing the
            // whole request over.
            if let Err(err) = self.repo.update_by_email(&existing.email, &patch).await {
                tracing::warn!(
                    error = ?err,
                    email = %existing.email,
                    "metadata refresh failed, returning existing referral code"
                );
            }
        }
        Ok(existing.referral_code)
    }

    async fn insert_new(&self, new_entry: NewWaitlistEntry) -> AppResult<String> {
        match self.repo.insert(&new_entry).await {
            Ok(entry) => Ok(entry.referral_code),
            // Two first-time submissions raced between lookup and insert and
            // the other one won. The unique constraint keeps the table
            // single-row per email; recover by reading the winner.
            Err(AppError::UniqueViolation) => {
                let winner = self
                    .repo
                    .find_by_email(&new_entry.email)
                    .await?
                    .ok_or_else(|| {
                        AppError::Database("row missing after unique violation".into())
                    })?;
                Ok(winner.referral_code)
            }
            Err(err) => Err(err),
        }
    }
}

/// Applies the repeat-submission field policy:
/// - `name` and the acquisition fields refresh when newly supplied non-empty;
/// - `referred_by` is write-once and only fills an empty slot.
fn build_patch(existing: &WaitlistEntry, new_entry: NewWaitlistEntry) -> WaitlistPatch {
    WaitlistPatch {
        name: new_entry.name,
        referred_by: if existing.has_referrer() {
            None
        } else {
            new_entry.referred_by
        },
        utm_source: new_entry.utm_source,
        utm_medium: new_entry.utm_medium,
        utm_campaign: new_entry.utm_campaign,
        utm_term: new_entry.utm_term,
        utm_content: new_entry.utm_content,
        signup_path: new_entry.signup_path,
        user_agent: new_entry.user_agent,
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}
