pub mod requests;
pub mod responses;

pub use requests::TtsRequest;
pub use responses::{ApiKeyResponse, CleanupResponse, HealthResponse, VoicesResponse};
