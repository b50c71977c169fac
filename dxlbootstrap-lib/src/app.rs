//! Base for persistent DXL applications.
//!
//! An [`Application`] reads its configuration directory, connects to the
//! fabric, lets its [`ApplicationHandler`] register event callbacks and
//! services, and tears everything down again in [`Application::destroy`].
//!
//! Lifecycle of [`Application::run`]:
//! 1. `on_run`
//! 2. both configuration files must be readable
//! 3. application configuration is loaded (pool settings, then `on_load_configuration`)
//! 4. the fabric client is created and connected
//! 5. `register_event_handlers`, `register_services`, `on_dxl_connect`

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, OnceCell};
use tracing::{info, warn};

use crate::config::{AppConfig, ClientConfig};
use crate::error::AppError;
use crate::fabric::{Connector, DxlClient, EventCallback, RequestCallback, ServiceRegistrationInfo};
use crate::message::Message;
use crate::pool::{CallbackPool, PoolSettings};

/// Name of the client configuration file inside the configuration directory.
pub const DXL_CLIENT_CONFIG_FILE: &str = "dxlclient.config";
/// Timeout used when registering and unregistering services.
pub const DXL_SERVICE_REGISTRATION_TIMEOUT: Duration = Duration::from_secs(60);

pub const INCOMING_MESSAGE_POOL_CONFIG_SECTION: &str = "IncomingMessagePool";
pub const MESSAGE_CALLBACK_POOL_CONFIG_SECTION: &str = "MessageCallbackPool";
pub const QUEUE_SIZE_CONFIG_PROP: &str = "queueSize";
pub const THREAD_COUNT_CONFIG_PROP: &str = "threadCount";

const CALLBACKS_POOL_NAME: &str = "CallbacksPool";

/// Hooks implemented by a concrete application.
#[async_trait]
pub trait ApplicationHandler: Send {
    /// Invoked first when the application is run.
    fn on_run(&mut self) -> Result<(), AppError>;

    /// Invoked once the application configuration file has been read.
    fn on_load_configuration(&mut self, config: &AppConfig) -> Result<(), AppError>;

    /// Invoked after connecting and registering handlers and services.
    async fn on_dxl_connect(&mut self, context: &AppContext) -> Result<(), AppError>;

    async fn register_event_handlers(&mut self, _context: &AppContext) -> Result<(), AppError> {
        Ok(())
    }

    async fn register_services(&mut self, _context: &AppContext) -> Result<(), AppError> {
        Ok(())
    }
}

struct ThreadedEventCallback {
    pool: Arc<CallbackPool>,
    delegate: Arc<dyn EventCallback>,
}

#[async_trait]
impl EventCallback for ThreadedEventCallback {
    async fn on_event(&self, event: Message) {
        let delegate = Arc::clone(&self.delegate);
        if let Err(err) = self
            .pool
            .add_task(Box::pin(async move { delegate.on_event(event).await }))
            .await
        {
            warn!("dropping event: {err}");
        }
    }
}

struct ThreadedRequestCallback {
    pool: Arc<CallbackPool>,
    delegate: Arc<dyn RequestCallback>,
}

#[async_trait]
impl RequestCallback for ThreadedRequestCallback {
    async fn on_request(&self, request: Message) {
        let delegate = Arc::clone(&self.delegate);
        if let Err(err) = self
            .pool
            .add_task(Box::pin(async move { delegate.on_request(request).await }))
            .await
        {
            warn!("dropping request: {err}");
        }
    }
}

/// What a connected application exposes to its handler.
pub struct AppContext {
    config_dir: PathBuf,
    dxl_client: Arc<dyn DxlClient>,
    callbacks_settings: PoolSettings,
    callbacks_pool: OnceCell<Arc<CallbackPool>>,
    services: Mutex<Vec<String>>,
}

impl AppContext {
    fn new(
        config_dir: PathBuf,
        dxl_client: Arc<dyn DxlClient>,
        callbacks_settings: PoolSettings,
    ) -> Self {
        Self {
            config_dir,
            dxl_client,
            callbacks_settings,
            callbacks_pool: OnceCell::new(),
            services: Mutex::new(Vec::new()),
        }
    }

    pub fn client(&self) -> Arc<dyn DxlClient> {
        Arc::clone(&self.dxl_client)
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Returns `path` relative to the configuration directory when it does
    /// not name a file as given but does inside the configuration directory.
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        resolve_config_path(&self.config_dir, path.as_ref())
    }

    /// The message-callback pool, once a separate-thread callback created it.
    pub fn callbacks_pool(&self) -> Option<&Arc<CallbackPool>> {
        self.callbacks_pool.get()
    }

    async fn ensure_callbacks_pool(&self) -> Arc<CallbackPool> {
        let settings = self.callbacks_settings;
        Arc::clone(
            self.callbacks_pool
                .get_or_init(|| async move {
                    Arc::new(CallbackPool::with_settings(settings, CALLBACKS_POOL_NAME))
                })
                .await,
        )
    }

    /// Subscribes `callback` to `topic`.
    ///
    /// With `separate_thread` the callback runs on the message-callback pool
    /// instead of the incoming-message pool, which is required when the
    /// callback itself issues synchronous requests.
    pub async fn add_event_callback(
        &self,
        topic: &str,
        callback: Arc<dyn EventCallback>,
        separate_thread: bool,
    ) -> Result<(), AppError> {
        let callback: Arc<dyn EventCallback> = if separate_thread {
            Arc::new(ThreadedEventCallback {
                pool: self.ensure_callbacks_pool().await,
                delegate: callback,
            })
        } else {
            callback
        };
        self.dxl_client.add_event_callback(topic, callback).await?;
        Ok(())
    }

    pub async fn add_request_callback(
        &self,
        service: &mut ServiceRegistrationInfo,
        topic: &str,
        callback: Arc<dyn RequestCallback>,
        separate_thread: bool,
    ) -> Result<(), AppError> {
        let callback: Arc<dyn RequestCallback> = if separate_thread {
            Arc::new(ThreadedRequestCallback {
                pool: self.ensure_callbacks_pool().await,
                delegate: callback,
            })
        } else {
            callback
        };
        service.add_topic(topic, callback);
        Ok(())
    }

    pub async fn register_service(&self, service: ServiceRegistrationInfo) -> Result<(), AppError> {
        let service_id = service.service_id().to_string();
        info!(service_type = service.service_type(), "registering service");
        self.dxl_client
            .register_service_sync(service, DXL_SERVICE_REGISTRATION_TIMEOUT)
            .await?;
        self.services.lock().await.push(service_id);
        Ok(())
    }

    pub async fn registered_services(&self) -> Vec<String> {
        self.services.lock().await.clone()
    }

    async fn shutdown(&self) -> Result<(), AppError> {
        if let Some(pool) = self.callbacks_pool.get() {
            pool.shutdown().await;
        }

        let services: Vec<String> = self.services.lock().await.drain(..).collect();
        for service_id in services {
            if let Err(err) = self
                .dxl_client
                .unregister_service_sync(&service_id, DXL_SERVICE_REGISTRATION_TIMEOUT)
                .await
            {
                warn!(service_id, "failed to unregister service: {err}");
            }
        }

        self.dxl_client.destroy().await?;
        Ok(())
    }
}

fn resolve_config_path(config_dir: &Path, path: &Path) -> PathBuf {
    if !path.is_file() && !path.is_absolute() {
        let relative = config_dir.join(path);
        if relative.is_file() {
            return relative;
        }
    }
    path.to_path_buf()
}

fn is_readable_file(path: &Path) -> bool {
    path.is_file() && fs::File::open(path).is_ok()
}

/// A persistent application driven by an [`ApplicationHandler`].
pub struct Application<H> {
    handler: H,
    config_dir: PathBuf,
    dxlclient_config_path: PathBuf,
    app_config_path: PathBuf,
    connector: Arc<dyn Connector>,
    incoming: PoolSettings,
    callbacks: PoolSettings,
    config: Option<AppConfig>,
    context: Option<Arc<AppContext>>,
    running: bool,
    destroyed: bool,
}

impl<H: ApplicationHandler> Application<H> {
    pub fn new(
        handler: H,
        config_dir: impl Into<PathBuf>,
        app_config_file_name: &str,
        connector: Arc<dyn Connector>,
    ) -> Self {
        let config_dir = config_dir.into();
        Self {
            handler,
            dxlclient_config_path: config_dir.join(DXL_CLIENT_CONFIG_FILE),
            app_config_path: config_dir.join(app_config_file_name),
            config_dir,
            connector,
            incoming: PoolSettings::default(),
            callbacks: PoolSettings::default(),
            config: None,
            context: None,
            running: false,
            destroyed: false,
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config(&self) -> Option<&AppConfig> {
        self.config.as_ref()
    }

    pub fn context(&self) -> Option<&Arc<AppContext>> {
        self.context.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.running && !self.destroyed
    }

    pub fn incoming_pool_settings(&self) -> PoolSettings {
        self.incoming
    }

    pub fn callback_pool_settings(&self) -> PoolSettings {
        self.callbacks
    }

    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        resolve_config_path(&self.config_dir, path.as_ref())
    }

    /// Runs the application. Fails if it has already been run.
    pub async fn run(&mut self) -> Result<(), AppError> {
        if self.running {
            return Err(AppError::AlreadyRunning);
        }
        self.running = true;
        info!("Running application ...");

        self.handler.on_run()?;
        self.validate_config_files()?;
        self.load_configuration()?;
        self.dxl_connect().await
    }

    /// Shuts down the callback pool, unregisters services and destroys the
    /// fabric client. Does nothing unless the application is running.
    pub async fn destroy(&mut self) -> Result<(), AppError> {
        if !self.running || self.destroyed {
            return Ok(());
        }
        info!("Destroying application ...");
        self.destroyed = true;
        if let Some(context) = self.context.take() {
            context.shutdown().await?;
        }
        Ok(())
    }

    fn validate_config_files(&self) -> Result<(), AppError> {
        if !is_readable_file(&self.dxlclient_config_path) {
            return Err(AppError::ClientConfigAccess(self.dxlclient_config_path.clone()));
        }
        if !is_readable_file(&self.app_config_path) {
            return Err(AppError::AppConfigAccess(self.app_config_path.clone()));
        }
        Ok(())
    }

    fn load_configuration(&mut self) -> Result<(), AppError> {
        let read_error = |details: String| AppError::AppConfigRead {
            path: self.app_config_path.clone(),
            details,
        };
        let contents =
            fs::read_to_string(&self.app_config_path).map_err(|e| read_error(e.to_string()))?;
        let config = AppConfig::parse(&contents).map_err(|e| read_error(e.to_string()))?;

        self.incoming =
            config.pool_settings(INCOMING_MESSAGE_POOL_CONFIG_SECTION, PoolSettings::default());
        self.callbacks =
            config.pool_settings(MESSAGE_CALLBACK_POOL_CONFIG_SECTION, PoolSettings::default());

        self.handler.on_load_configuration(&config)?;
        self.config = Some(config);
        Ok(())
    }

    async fn dxl_connect(&mut self) -> Result<(), AppError> {
        let client_config =
            ClientConfig::from_file(&self.dxlclient_config_path)?.with_incoming_pool(self.incoming);
        info!(
            "Incoming message configuration: queueSize={}, threadCount={}",
            self.incoming.queue_size, self.incoming.thread_count
        );
        info!(
            "Message callback configuration: queueSize={}, threadCount={}",
            self.callbacks.queue_size, self.callbacks.thread_count
        );

        let dxl_client = self.connector.create_client(client_config).await?;
        info!("Attempting to connect to DXL fabric ...");
        dxl_client.connect().await?;
        info!("Connected to DXL fabric.");

        let context = Arc::new(AppContext::new(
            self.config_dir.clone(),
            dxl_client,
            self.callbacks,
        ));
        self.context = Some(Arc::clone(&context));

        self.handler.register_event_handlers(&context).await?;
        self.handler.register_services(&context).await?;
        self.handler.on_dxl_connect(&context).await
    }
}

impl<H> Drop for Application<H> {
    fn drop(&mut self) {
        if self.running && !self.destroyed && self.context.is_some() {
            warn!("application dropped while connected; call destroy() to unregister services");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_config_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("certs.pem"), "x").unwrap();

        let resolved = resolve_config_path(dir.path(), Path::new("certs.pem"));
        assert_eq!(resolved, dir.path().join("certs.pem"));

        let missing = resolve_config_path(dir.path(), Path::new("missing.pem"));
        assert_eq!(missing, PathBuf::from("missing.pem"));

        let absolute = resolve_config_path(dir.path(), Path::new("/abs/file.pem"));
        assert_eq!(absolute, PathBuf::from("/abs/file.pem"));
    }

    #[test]
    fn test_directory_is_not_readable_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_readable_file(dir.path()));
    }
}
