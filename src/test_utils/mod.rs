//! In-memory mocks for HTTP-level and use-case-level testing.

use std::collections::HashMap;
use std::sync::{
    Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::HeaderValue;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    entities::waitlist_entry::WaitlistEntry,
    infra::config::AppConfig,
    use_cases::waitlist::{NewWaitlistEntry, SignupUseCases, WaitlistPatch, WaitlistRepo},
};

/// In-memory implementation of [`WaitlistRepo`], keyed on email like the real
/// table, with a couple of failure-injection switches.
#[derive(Default)]
pub struct InMemoryWaitlistRepo {
    entries: Mutex<HashMap<String, WaitlistEntry>>,
    code_counter: AtomicUsize,
    conflict_next_insert: AtomicBool,
    fail_inserts: AtomicBool,
    fail_updates: AtomicBool,
}

impl InMemoryWaitlistRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, email: &str) -> Option<WaitlistEntry> {
        self.entries.lock().unwrap().get(email).cloned()
    }

    /// The next insert behaves as if a concurrent request inserted the same
    /// email first: the row appears (under another referral code) and the
    /// insert itself reports a unique violation.
    pub fn conflict_on_next_insert(&self) {
        self.conflict_next_insert.store(true, Ordering::SeqCst);
    }

    pub fn fail_inserts(&self) {
        self.fail_inserts.store(true, Ordering::SeqCst);
    }

    pub fn fail_updates(&self) {
        self.fail_updates.store(true, Ordering::SeqCst);
    }

    fn build_entry(&self, new_entry: &NewWaitlistEntry) -> WaitlistEntry {
        let n = self.code_counter.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        WaitlistEntry {
            id: Uuid::new_v4(),
            email: new_entry.email.clone(),
            name: new_entry.name.clone(),
            referral_code: format!("TESTCODE{n}"),
            referred_by: new_entry.referred_by.clone(),
            utm_source: new_entry.utm_source.clone(),
            utm_medium: new_entry.utm_medium.clone(),
            utm_campaign: new_entry.utm_campaign.clone(),
            utm_term: new_entry.utm_term.clone(),
            utm_content: new_entry.utm_content.clone(),
            signup_path: new_entry.signup_path.clone(),
            user_agent: new_entry.user_agent.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[async_trait]
impl WaitlistRepo for InMemoryWaitlistRepo {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<WaitlistEntry>> {
        Ok(self.entries.lock().unwrap().get(email).cloned())
    }

    async fn insert(&self, entry: &NewWaitlistEntry) -> AppResult<WaitlistEntry> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(AppError::Database("injected insert failure".into()));
        }
        if self.conflict_next_insert.swap(false, Ordering::SeqCst) {
            let winner = self.build_entry(entry);
            self.entries
                .lock()
                .unwrap()
                .insert(winner.email.clone(), winner);
            return Err(AppError::UniqueViolation);
        }

        let mut entries = self.entries.lock().unwrap();
        if entries.contains_key(&entry.email) {
            return Err(AppError::UniqueViolation);
        }
        let created = self.build_entry(entry);
        entries.insert(created.email.clone(), created.clone());
        Ok(created)
    }

    async fn update_by_email(&self, email: &str, patch: &WaitlistPatch) -> AppResult<()> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(AppError::Database("injected update failure".into()));
        }
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.get_mut(email) {
            apply_patch(entry, patch);
        }
        Ok(())
    }
}

// Mirrors the COALESCE semantics of the Postgres adapter.
fn apply_patch(entry: &mut WaitlistEntry, patch: &WaitlistPatch) {
    if let Some(name) = &patch.name {
        entry.name = Some(name.clone());
    }
    if entry.referred_by.is_none() {
        entry.referred_by = patch.referred_by.clone();
    }
    if let Some(v) = &patch.utm_source {
        entry.utm_source = Some(v.clone());
    }
    if let Some(v) = &patch.utm_medium {
        entry.utm_medium = Some(v.clone());
    }
    if let Some(v) = &patch.utm_campaign {
        entry.utm_campaign = Some(v.clone());
    }
    if let Some(v) = &patch.utm_term {
        entry.utm_term = Some(v.clone());
    }
    if let Some(v) = &patch.utm_content {
        entry.utm_content = Some(v.clone());
    }
    if let Some(v) = &patch.signup_path {
        entry.signup_path = Some(v.clone());
    }
    if let Some(v) = &patch.user_agent {
        entry.user_agent = Some(v.clone());
    }
    entry.updated_at = Utc::now();
}

pub fn test_config() -> AppConfig {
    AppConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        database_url: "postgres://unused".to_string(),
        cors_origin: HeaderValue::from_static("http://localhost:3000"),
        db_max_connections: 1,
    }
}

pub fn test_app_state(repo: Arc<InMemoryWaitlistRepo>) -> AppState {
    let signup_use_cases = SignupUseCases::new(repo as Arc<dyn WaitlistRepo>);
    AppState {
        config: Arc::new(test_config()),
        signup_use_cases: Arc::new(signup_use_cases),
    }
}
