use std::sync::Arc;

use crate::{infra::config::AppConfig, use_cases::waitlist::SignupUseCases};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub signup_use_cases: Arc<SignupUseCases>,
}
