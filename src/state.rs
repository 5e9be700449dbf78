use crate::client::Backend;
use crate::storage::ProfileStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProfileStore>,
    pub backend: Arc<dyn Backend>,
    pub timezone: String,
}

impl AppState {
    pub fn new(store: Arc<dyn ProfileStore>, backend: Arc<dyn Backend>, timezone: impl Into<String>) -> Self {
        Self {
            store,
            backend,
            timezone: timezone.into(),
        }
    }
}
