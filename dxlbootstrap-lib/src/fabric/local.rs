//! In-process fabric.
//!
//! Every [`LocalClient`] created from the same [`LocalFabric`] shares one bus.
//! Incoming events and requests are dispatched on the receiving client's
//! incoming-message pool, sized from its [`ClientConfig`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio::sync::{Mutex, oneshot};
use tokio::time::{self, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{
    Connector, DxlClient, EventCallback, RequestCallback, SERVICE_UNAVAILABLE_ERROR_CODE,
    ServiceRegistrationInfo,
};
use crate::config::ClientConfig;
use crate::error::FabricError;
use crate::message::Message;
use crate::pool::CallbackPool;

struct ClientShared {
    id: String,
    incoming: StdMutex<Option<Arc<CallbackPool>>>,
}

impl ClientShared {
    fn incoming_pool(&self) -> Option<Arc<CallbackPool>> {
        self.incoming.lock().ok().and_then(|pool| pool.clone())
    }

    async fn dispatch(&self, task: BoxFuture<'static, ()>) -> Result<(), FabricError> {
        match self.incoming_pool() {
            Some(pool) => Ok(pool.add_task(task).await?),
            None => Err(FabricError::NotConnected(self.id.clone())),
        }
    }
}

struct Subscription {
    owner: Arc<ClientShared>,
    callback: Arc<dyn EventCallback>,
}

struct Route {
    service_id: String,
    owner: Arc<ClientShared>,
    callback: Arc<dyn RequestCallback>,
}

struct RegisteredService {
    owner_id: String,
    topics: Vec<String>,
}

#[derive(Default)]
struct Bus {
    subscriptions: HashMap<String, Vec<Subscription>>,
    routes: HashMap<String, Route>,
    services: HashMap<String, RegisteredService>,
    pending: HashMap<String, oneshot::Sender<Message>>,
}

/// Shared in-process bus. Cloning yields a handle to the same bus.
#[derive(Clone, Default)]
pub struct LocalFabric {
    bus: Arc<Mutex<Bus>>,
}

impl LocalFabric {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client(&self, config: ClientConfig) -> Arc<LocalClient> {
        Arc::new(LocalClient {
            fabric: self.clone(),
            shared: Arc::new(ClientShared {
                id: Uuid::new_v4().to_string(),
                incoming: StdMutex::new(None),
            }),
            config,
            connected: AtomicBool::new(false),
        })
    }

    /// Number of services currently registered on the bus.
    pub async fn service_count(&self) -> usize {
        self.bus.lock().await.services.len()
    }
}

#[async_trait]
impl Connector for LocalFabric {
    async fn create_client(
        &self,
        config: ClientConfig,
    ) -> Result<Arc<dyn DxlClient>, FabricError> {
        Ok(self.client(config))
    }
}

pub struct LocalClient {
    fabric: LocalFabric,
    shared: Arc<ClientShared>,
    config: ClientConfig,
    connected: AtomicBool,
}

impl LocalClient {
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn ensure_connected(&self) -> Result<(), FabricError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(FabricError::NotConnected(self.shared.id.clone()))
        }
    }
}

#[async_trait]
impl DxlClient for LocalClient {
    fn client_id(&self) -> &str {
        &self.shared.id
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> Result<(), FabricError> {
        if self.connected.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let pool = CallbackPool::with_settings(
            self.config.incoming_pool(),
            format!("incoming-{}", self.shared.id),
        );
        if let Ok(mut incoming) = self.shared.incoming.lock() {
            *incoming = Some(Arc::new(pool));
        }
        debug!(client = %self.shared.id, "connected to local fabric");
        Ok(())
    }

    async fn add_event_callback(
        &self,
        topic: &str,
        callback: Arc<dyn EventCallback>,
    ) -> Result<(), FabricError> {
        let mut bus = self.fabric.bus.lock().await;
        bus.subscriptions
            .entry(topic.to_string())
            .or_default()
            .push(Subscription {
                owner: Arc::clone(&self.shared),
                callback,
            });
        debug!(client = %self.shared.id, topic, "event callback added");
        Ok(())
    }

    async fn send_event(&self, mut event: Message) -> Result<(), FabricError> {
        self.ensure_connected()?;
        event.source_client_id = Some(self.shared.id.clone());

        let targets: Vec<(Arc<ClientShared>, Arc<dyn EventCallback>)> = {
            let bus = self.fabric.bus.lock().await;
            bus.subscriptions
                .get(&event.topic)
                .map(|subs| {
                    subs.iter()
                        .map(|s| (Arc::clone(&s.owner), Arc::clone(&s.callback)))
                        .collect()
                })
                .unwrap_or_default()
        };

        for (owner, callback) in targets {
            let delivered = event.clone();
            if let Err(err) = owner
                .dispatch(Box::pin(async move { callback.on_event(delivered).await }))
                .await
            {
                warn!(client = %owner.id, topic = %event.topic, "event not delivered: {err}");
            }
        }
        Ok(())
    }

    async fn sync_request(
        &self,
        mut request: Message,
        timeout: Duration,
    ) -> Result<Message, FabricError> {
        self.ensure_connected()?;
        let deadline = Instant::now() + timeout;
        request.source_client_id = Some(self.shared.id.clone());
        let message_id = request.message_id.clone();

        let (sender, receiver) = oneshot::channel();
        let (owner, callback) = {
            let mut bus = self.fabric.bus.lock().await;
            let Some(route) = bus.routes.get(&request.topic) else {
                debug!(topic = %request.topic, "no service for request");
                return Ok(Message::error_response_to(
                    &request,
                    SERVICE_UNAVAILABLE_ERROR_CODE,
                    "unable to locate service for request",
                ));
            };
            request.service_id = Some(route.service_id.clone());
            let target = (Arc::clone(&route.owner), Arc::clone(&route.callback));
            bus.pending.insert(message_id.clone(), sender);
            target
        };

        let dispatch = owner.dispatch(Box::pin(async move { callback.on_request(request).await }));
        let failure = match time::timeout_at(deadline, dispatch).await {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(err),
            Err(_) => Some(FabricError::Timeout {
                message_id: message_id.clone(),
                timeout,
            }),
        };
        if let Some(err) = failure {
            self.fabric.bus.lock().await.pending.remove(&message_id);
            return Err(err);
        }

        match time::timeout_at(deadline, receiver).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(FabricError::ResponseDropped(message_id)),
            Err(_) => {
                self.fabric.bus.lock().await.pending.remove(&message_id);
                Err(FabricError::Timeout { message_id, timeout })
            }
        }
    }

    async fn send_response(&self, mut response: Message) -> Result<(), FabricError> {
        self.ensure_connected()?;
        response.source_client_id = Some(self.shared.id.clone());

        let waiter = match response.request_message_id.as_deref() {
            Some(request_id) => self.fabric.bus.lock().await.pending.remove(request_id),
            None => None,
        };
        match waiter {
            Some(waiter) => {
                // The requester may have timed out in the meantime.
                let _ = waiter.send(response);
            }
            None => debug!(
                request = ?response.request_message_id,
                "no pending request for response"
            ),
        }
        Ok(())
    }

    async fn register_service_sync(
        &self,
        service: ServiceRegistrationInfo,
        _timeout: Duration,
    ) -> Result<(), FabricError> {
        self.ensure_connected()?;
        let mut bus = self.fabric.bus.lock().await;

        for topic in service.topics() {
            if let Some(route) = bus.routes.get(topic) {
                if route.service_id != service.service_id() {
                    return Err(FabricError::TopicInUse {
                        topic: topic.to_string(),
                        service_id: route.service_id.clone(),
                    });
                }
            }
        }

        for (topic, callback) in service.callbacks() {
            bus.routes.insert(
                topic.to_string(),
                Route {
                    service_id: service.service_id().to_string(),
                    owner: Arc::clone(&self.shared),
                    callback: Arc::clone(callback),
                },
            );
        }
        bus.services.insert(
            service.service_id().to_string(),
            RegisteredService {
                owner_id: self.shared.id.clone(),
                topics: service.topics().map(str::to_string).collect(),
            },
        );
        debug!(
            service_type = service.service_type(),
            service_id = service.service_id(),
            "service registered"
        );
        Ok(())
    }

    async fn unregister_service_sync(
        &self,
        service_id: &str,
        _timeout: Duration,
    ) -> Result<(), FabricError> {
        let mut bus = self.fabric.bus.lock().await;
        let service = bus
            .services
            .remove(service_id)
            .ok_or_else(|| FabricError::UnknownService(service_id.to_string()))?;
        for topic in service.topics {
            if bus.routes.get(&topic).is_some_and(|r| r.service_id == service_id) {
                bus.routes.remove(&topic);
            }
        }
        debug!(service_id, "service unregistered");
        Ok(())
    }

    async fn destroy(&self) -> Result<(), FabricError> {
        self.connected.store(false, Ordering::SeqCst);
        {
            let mut bus = self.fabric.bus.lock().await;
            let id = self.shared.id.as_str();
            for subs in bus.subscriptions.values_mut() {
                subs.retain(|s| s.owner.id != id);
            }
            bus.subscriptions.retain(|_, subs| !subs.is_empty());
            bus.routes.retain(|_, route| route.owner.id != id);
            bus.services.retain(|_, service| service.owner_id != id);
        }

        let pool = self.shared.incoming.lock().ok().and_then(|mut pool| pool.take());
        if let Some(pool) = pool {
            pool.shutdown().await;
        }
        debug!(client = %self.shared.id, "destroyed local client");
        Ok(())
    }
}
