// Service-level endpoints (banner and liveness)

use crate::client::ClassCheckClient;
use crate::error::Error;
use crate::types::{HealthResponse, ServiceInfo};

impl ClassCheckClient {
    /// `GET /`
    pub async fn service_info(&self) -> Result<ServiceInfo, Error> {
        self.get("").await
    }

    /// `GET /health`
    pub async fn health(&self) -> Result<HealthResponse, Error> {
        self.get("health").await
    }
}
