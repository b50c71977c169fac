//! Fabric abstraction
//!
//! The base client and base application talk to the fabric only through
//! the [`DxlClient`] trait. A [`Connector`] creates clients from a
//! [`ClientConfig`]. [`LocalFabric`] is an in-process implementation.

pub mod local;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::FabricError;
use crate::message::Message;

pub use local::{LocalClient, LocalFabric};

/// Error code returned when a request targets a topic nobody services.
pub const SERVICE_UNAVAILABLE_ERROR_CODE: i32 = 0x8000_0001_u32 as i32;

#[async_trait]
pub trait EventCallback: Send + Sync {
    async fn on_event(&self, event: Message);
}

#[async_trait]
pub trait RequestCallback: Send + Sync {
    async fn on_request(&self, request: Message);
}

/// A service and the request callbacks it exposes, by topic.
#[derive(Clone)]
pub struct ServiceRegistrationInfo {
    service_id: String,
    service_type: String,
    callbacks: BTreeMap<String, Arc<dyn RequestCallback>>,
}

impl ServiceRegistrationInfo {
    pub fn new(service_type: impl Into<String>) -> Self {
        Self {
            service_id: Uuid::new_v4().to_string(),
            service_type: service_type.into(),
            callbacks: BTreeMap::new(),
        }
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    /// Adds (or replaces) the callback for `topic`.
    pub fn add_topic(&mut self, topic: impl Into<String>, callback: Arc<dyn RequestCallback>) {
        self.callbacks.insert(topic.into(), callback);
    }

    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.callbacks.keys().map(String::as_str)
    }

    pub fn callbacks(&self) -> impl Iterator<Item = (&str, &Arc<dyn RequestCallback>)> {
        self.callbacks.iter().map(|(t, c)| (t.as_str(), c))
    }
}

impl std::fmt::Debug for ServiceRegistrationInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistrationInfo")
            .field("service_id", &self.service_id)
            .field("service_type", &self.service_type)
            .field("topics", &self.callbacks.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A connection to the fabric.
#[async_trait]
pub trait DxlClient: Send + Sync {
    fn client_id(&self) -> &str;

    fn is_connected(&self) -> bool;

    async fn connect(&self) -> Result<(), FabricError>;

    async fn add_event_callback(
        &self,
        topic: &str,
        callback: Arc<dyn EventCallback>,
    ) -> Result<(), FabricError>;

    async fn send_event(&self, event: Message) -> Result<(), FabricError>;

    /// Sends `request` and waits up to `timeout` for its response.
    async fn sync_request(
        &self,
        request: Message,
        timeout: Duration,
    ) -> Result<Message, FabricError>;

    async fn send_response(&self, response: Message) -> Result<(), FabricError>;

    async fn register_service_sync(
        &self,
        service: ServiceRegistrationInfo,
        timeout: Duration,
    ) -> Result<(), FabricError>;

    async fn unregister_service_sync(
        &self,
        service_id: &str,
        timeout: Duration,
    ) -> Result<(), FabricError>;

    /// Disconnects and releases everything the client registered.
    async fn destroy(&self) -> Result<(), FabricError>;
}

/// Creates fabric clients.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn create_client(&self, config: ClientConfig) -> Result<Arc<dyn DxlClient>, FabricError>;
}
