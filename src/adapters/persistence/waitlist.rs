use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    entities::waitlist_entry::WaitlistEntry,
    use_cases::waitlist::{NewWaitlistEntry, WaitlistPatch, WaitlistRepo},
};

// Waitlist row as stored in the db.
#[derive(sqlx::FromRow, Debug)]
pub struct WaitlistRow {
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

impl From<WaitlistRow> for WaitlistEntry {
    fn from(row: WaitlistRow) -> Self {
        WaitlistEntry {
            id: row.id,
            email: row.email,
            name: row.name,
            referral_code: row.referral_code,
            referred_by: row.referred_by,
            utm_source: row.utm_source,
            utm_medium: row.utm_medium,
            utm_campaign: row.utm_campaign,
            utm_term: row.utm_term,
            utm_content: row.utm_content,
            signup_path: row.signup_path,
            user_agent: row.user_agent,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_COLUMNS: &str = "id, email, name, referral_code, referred_by, \
     utm_source, utm_medium, utm_campaign, utm_term, utm_content, \
     signup_path, user_agent, created_at, updated_at";

#[async_trait]
impl WaitlistRepo for PostgresPersistence {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<WaitlistEntry>> {
        let row = sqlx::query_as::<_, WaitlistRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM waitlist WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(row.map(WaitlistEntry::from))
    }

    async fn insert(&self, entry: &NewWaitlistEntry) -> AppResult<WaitlistEntry> {
        let id = Uuid::new_v4();
        let referral_code = generate_referral_code();
        let row = sqlx::query_as::<_, WaitlistRow>(&format!(
            r#"
                INSERT INTO waitlist (
                    id, email, name, referral_code, referred_by,
                    utm_source, utm_medium, utm_campaign, utm_term, utm_content,
                    signup_path, user_agent
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&entry.email)
        .bind(&entry.name)
        .bind(&referral_code)
        .bind(&entry.referred_by)
        .bind(&entry.utm_source)
        .bind(&entry.utm_medium)
        .bind(&entry.utm_campaign)
        .bind(&entry.utm_term)
        .bind(&entry.utm_content)
        .bind(&entry.signup_path)
        .bind(&entry.user_agent)
        .fetch_one(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(row.into())
    }

    async fn update_by_email(&self, email: &str, patch: &WaitlistPatch) -> AppResult<()> {
        // COALESCE argument order encodes the field policy: metadata fields
        // take the new value when one was supplied, while referred_by only
        // ever fills an empty slot (write-once, enforced here as well as in
        // the use case).
        sqlx::query(
            r#"
                UPDATE waitlist SET
                    name = COALESCE($2, name),
                    referred_by = COALESCE(referred_by, $3),
                    utm_source = COALESCE($4, utm_source),
                    utm_medium = COALESCE($5, utm_medium),
                    utm_campaign = COALESCE($6, utm_campaign),
                    utm_term = COALESCE($7, utm_term),
                    utm_content = COALESCE($8, utm_content),
                    signup_path = COALESCE($9, signup_path),
                    user_agent = COALESCE($10, user_agent),
                    updated_at = now()
                WHERE email = $1
            "#,
        )
        .bind(email)
        .bind(&patch.name)
        .bind(&patch.referred_by)
        .bind(&patch.utm_source)
        .bind(&patch.utm_medium)
        .bind(&patch.utm_campaign)
        .bind(&patch.utm_term)
        .bind(&patch.utm_content)
        .bind(&patch.signup_path)
        .bind(&patch.user_agent)
        .execute(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(())
    }
}

/// Referral code handed back to every successful submission. 9 random bytes
/// gives a 12-character URL-safe token, short enough to share by hand.
fn generate_referral_code() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 9];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}
