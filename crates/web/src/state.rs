use std::sync::Arc;

use storage::services::JudgingService;

use crate::middleware::auth::ApiKeys;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<JudgingService>,
    pub api_keys: ApiKeys,
}

impl AppState {
    pub fn new(service: JudgingService, api_keys: ApiKeys) -> Self {
        Self {
            service: Arc::new(service),
            api_keys,
        }
    }
}
