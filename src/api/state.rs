use std::sync::Arc;

use crate::gateway::{RequestPipeline, TestSession};
use crate::storage::Storage;

/// Application state shared across all API handlers
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Storage>,
    pub pipeline: Arc<RequestPipeline>,
    pub test_session: TestSession,
}

impl AppState {
    pub fn new(
        storage: Arc<Storage>,
        pipeline: Arc<RequestPipeline>,
        test_session: TestSession,
    ) -> Self {
        Self {
            storage,
            pipeline,
            test_session,
        }
    }
}
