use std::sync::Arc;

use textrelay_dispatch::Dispatcher;
use textrelay_store::SessionStore;

/// Shared by every handler.
#[derive(Debug)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub store: Arc<dyn SessionStore>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, store: Arc<dyn SessionStore>) -> Arc<Self> {
        Arc::new(Self { dispatcher, store })
    }
}
