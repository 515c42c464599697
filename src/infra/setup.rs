use std::fs::File;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::{http::app_state::AppState, persistence::PostgresPersistence},
    infra::{config::AppConfig, db::init_db},
    use_cases::waitlist::{SignupUseCases, WaitlistRepo},
};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();

    let pool = init_db(&config.database_url, config.db_max_connections).await?;
    let persistence = Arc::new(PostgresPersistence::new(pool));

    let waitlist_repo = persistence as Arc<dyn WaitlistRepo>;
    let signup_use_cases = SignupUseCases::new(waitlist_repo);

    Ok(AppState {
        config: Arc::new(config),
        signup_use_cases: Arc::new(signup_use_cases),
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "savinek_api=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer().with_target(false).with_level(true).pretty();

    // File (structured JSON logs)
    let file = File::create("app.log").expect("cannot create log file");
    let json_layer = fmt::layer()
        .json()
        .with_writer(file)
        .with_current_span(true)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
