//! Base type for DXL client wrappers.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::ClientError;
use crate::fabric::DxlClient;
use crate::message::Message;

/// Default time to wait for a response from a DXL service.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);
/// Smallest response timeout a wrapper may configure.
pub const MIN_RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

/// Wraps a fabric connection for a client wrapper.
///
/// Wrappers embed a `Client` and expose typed methods that build requests
/// and hand them to [`Client::sync_request`].
#[derive(Clone)]
pub struct Client {
    dxl_client: Arc<dyn DxlClient>,
    response_timeout: Duration,
}

impl Client {
    pub fn new(dxl_client: Arc<dyn DxlClient>) -> Self {
        Self {
            dxl_client,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }

    pub fn dxl_client(&self) -> &Arc<dyn DxlClient> {
        &self.dxl_client
    }

    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }

    pub fn set_response_timeout(&mut self, response_timeout: Duration) -> Result<(), ClientError> {
        if response_timeout < MIN_RESPONSE_TIMEOUT {
            return Err(ClientError::ResponseTimeoutTooSmall {
                min: MIN_RESPONSE_TIMEOUT.as_secs(),
            });
        }
        self.response_timeout = response_timeout;
        Ok(())
    }

    /// Sends `request` and waits for the response.
    ///
    /// An error response from the service is returned as
    /// [`ClientError::ErrorResponse`].
    pub async fn sync_request(&self, request: Message) -> Result<Message, ClientError> {
        debug!(topic = %request.topic, "sending request");
        let response = self
            .dxl_client
            .sync_request(request, self.response_timeout)
            .await?;

        if response.is_error() {
            return Err(ClientError::ErrorResponse {
                message: response.error_message,
                code: response.error_code,
            });
        }
        Ok(response)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("client_id", &self.dxl_client.client_id())
            .field("response_timeout", &self.response_timeout)
            .finish()
    }
}
