use std::sync::Arc;

use crate::confirm::Confirmer;
use crate::gateway::SchoolApi;
use crate::notify::Notifier;

/// Capabilities every view is built from.
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn SchoolApi>,
    pub notifier: Arc<dyn Notifier>,
    pub confirmer: Arc<dyn Confirmer>,
}

impl AppState {
    pub fn new(api: Arc<dyn SchoolApi>, notifier: Arc<dyn Notifier>, confirmer: Arc<dyn Confirmer>) -> Self {
        Self {
            api,
            notifier,
            confirmer,
        }
    }
}
