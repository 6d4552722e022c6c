pub mod api;
pub mod api_response;
pub mod content;
pub mod error;
pub mod gateway;
pub mod models;
pub mod paths;
pub mod storage;

use std::path::Path;
use std::sync::Arc;

use content::ContentStore;
use gateway::dispatcher::TriggerDispatcher;
use gateway::pipeline::RequestPipeline;
use gateway::sender::WebhookSender;
use gateway::test_session::TestSession;
use storage::Storage;

/// Core gateway state shared between the server and tests: storage, the
/// inbound pipeline and the outbound dispatcher.
pub struct GatewayCore {
    pub storage: Arc<Storage>,
    pub pipeline: Arc<RequestPipeline>,
    pub test_session: TestSession,
    pub dispatcher: Arc<TriggerDispatcher>,
}

impl GatewayCore {
    pub fn new(
        db_path: impl AsRef<Path>,
        content: Arc<dyn ContentStore>,
        site_url: &str,
    ) -> anyhow::Result<Self> {
        let storage = Arc::new(Storage::new(db_path)?);

        let sender = WebhookSender::new(storage.logs.clone(), site_url);
        let dispatcher = Arc::new(TriggerDispatcher::new(
            Arc::new(storage.config.clone()),
            sender,
        ));

        let test_session = TestSession::new();
        let pipeline = Arc::new(RequestPipeline::new(
            storage.clone(),
            content,
            test_session.clone(),
        ));

        tracing::info!("Webhook gateway initialized");

        Ok(Self {
            storage,
            pipeline,
            test_session,
            dispatcher,
        })
    }
}
