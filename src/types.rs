use crate::store::CallStore;

use std::sync::Arc;

pub struct AppState {
    pub store: Arc<dyn CallStore>,
}
