use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{FromRequest, Multipart, Request, State},
    http::header,
    response::IntoResponse,
    routing::post,
};
use serde_json::{Value, json};

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    use_cases::waitlist::SignupForm,
};

const MAX_BODY_BYTES: usize = 64 * 1024;

pub fn router() -> Router<AppState> {
    Router::new().route("/waitlist", post(join_waitlist))
}

/// `POST /api/waitlist` — the landing page's sign-up endpoint.
///
/// Accepts JSON, urlencoded, or multipart bodies (the page submits JSON from
/// script and falls back to a plain form post without it). Anything else is
/// rejected before touching the database.
async fn join_waitlist(
    State(app_state): State<AppState>,
    request: Request,
) -> AppResult<impl IntoResponse> {
    let user_agent = header_str(&request, header::USER_AGENT);
    let content_type = header_str(&request, header::CONTENT_TYPE).to_lowercase();

    let mut form = if content_type.starts_with("application/json") {
        parse_json(request).await?
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        parse_urlencoded(request).await?
    } else if content_type.starts_with("multipart/form-data") {
        parse_multipart(request).await?
    } else {
        return Err(AppError::UnsupportedMediaType);
    };
    // The user agent comes off the transport header, never out of the body.
    form.user_agent = user_agent;

    let referral_code = app_state.signup_use_cases.submit(form).await?;
    Ok(Json(json!({ "ok": true, "referralCode": referral_code })))
}

fn header_str(request: &Request, name: header::HeaderName) -> String {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .trim()
        .to_string()
}

async fn parse_json(request: Request) -> AppResult<SignupForm> {
    let bytes = body_bytes(request).await?;
    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|err| AppError::Internal(format!("malformed JSON body: {err}")))?;
    // Non-string values (numbers, nulls, nested objects) count as absent.
    Ok(form_from_lookup(|key| {
        value
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string()
    }))
}

async fn parse_urlencoded(request: Request) -> AppResult<SignupForm> {
    let bytes = body_bytes(request).await?;
    let fields: HashMap<String, String> = url::form_urlencoded::parse(&bytes)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    Ok(form_from_lookup(|key| {
        fields.get(key).map(|v| v.trim()).unwrap_or_default().to_string()
    }))
}

async fn parse_multipart(request: Request) -> AppResult<SignupForm> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|err| AppError::Internal(format!("malformed multipart body: {err}")))?;

    let mut fields: HashMap<String, String> = HashMap::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::Internal(format!("malformed multipart body: {err}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let text = field
            .text()
            .await
            .map_err(|err| AppError::Internal(format!("malformed multipart body: {err}")))?;
        fields.entry(name).or_insert(text);
    }
    Ok(form_from_lookup(|key| {
        fields.get(key).map(|v| v.trim()).unwrap_or_default().to_string()
    }))
}

async fn body_bytes(request: Request) -> AppResult<axum::body::Bytes> {
    axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|err| AppError::Internal(format!("failed to read body: {err}")))
}

fn form_from_lookup(mut get: impl FnMut(&str) -> String) -> SignupForm {
    // "ref" is what the referral links put in the form; "referred_by" is
    // accepted as the spelled-out fallback.
    let mut referred_by = get("ref");
    if referred_by.is_empty() {
        referred_by = get("referred_by");
    }
    SignupForm {
        email: get("email"),
        name: get("name"),
        referred_by,
        utm_source: get("utm_source"),
        utm_medium: get("utm_medium"),
        utm_campaign: get("utm_campaign"),
        utm_term: get("utm_term"),
        utm_content: get("utm_content"),
        signup_path: get("signup_path"),
        user_agent: String::new(),
    }
}
