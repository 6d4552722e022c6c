pub mod auth;
pub mod dispatcher;
pub mod pipeline;
pub mod rate_limit;
pub mod router;
pub mod sender;
pub mod test_session;

pub use auth::AuthGate;
pub use dispatcher::TriggerDispatcher;
pub use pipeline::{InboundRequest, RequestPipeline};
pub use rate_limit::RateLimiter;
pub use router::{ActionRouter, WebhookAction};
pub use sender::WebhookSender;
pub use test_session::TestSession;
