use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use dxlbootstrap::app::DXL_CLIENT_CONFIG_FILE;
use dxlbootstrap::config::AppConfig;
use dxlbootstrap::fabric::{
    DxlClient, EventCallback, LocalFabric, RequestCallback, ServiceRegistrationInfo,
};
use dxlbootstrap::message_utils::{decode_payload, encode_payload};
use dxlbootstrap::pool::PoolSettings;
use dxlbootstrap::{AppContext, AppError, Application, ApplicationHandler, Client, Message};
use dxlbootstrap::error::PoolError;
use tokio::sync::{Semaphore, mpsc};

const APP_CONFIG_FILE: &str = "myapp.config";

fn write_config(dir: &Path, app_config: &str) {
    fs::write(
        dir.join(DXL_CLIENT_CONFIG_FILE),
        "[Certs]\nBrokerCertChain = \"ca.crt\"\n\n[Brokers]\nb1 = \"b1;8883;localhost\"\n",
    )
    .unwrap();
    fs::write(dir.join(APP_CONFIG_FILE), app_config).unwrap();
}

struct Recorder {
    seen: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl EventCallback for Recorder {
    async fn on_event(&self, event: Message) {
        let _ = self.seen.send(decode_payload(&event).unwrap());
    }
}

struct Echo {
    client: Arc<dyn DxlClient>,
}

#[async_trait]
impl RequestCallback for Echo {
    async fn on_request(&self, request: Message) {
        let mut response = Message::response_to(&request);
        encode_payload(&mut response, &format!("echo: {}", decode_payload(&request).unwrap()));
        self.client.send_response(response).await.unwrap();
    }
}

struct TestHandler {
    calls: Arc<StdMutex<Vec<&'static str>>>,
    events: Option<mpsc::UnboundedSender<String>>,
    service_id: Option<String>,
    greeting: Option<String>,
}

impl TestHandler {
    fn new(calls: Arc<StdMutex<Vec<&'static str>>>) -> Self {
        Self {
            calls,
            events: None,
            service_id: None,
            greeting: None,
        }
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ApplicationHandler for TestHandler {
    fn on_run(&mut self) -> Result<(), AppError> {
        self.record("on_run");
        Ok(())
    }

    fn on_load_configuration(&mut self, config: &AppConfig) -> Result<(), AppError> {
        self.record("on_load_configuration");
        self.greeting = config.get_str("General", "greeting").map(str::to_string);
        Ok(())
    }

    async fn register_event_handlers(&mut self, context: &AppContext) -> Result<(), AppError> {
        self.record("register_event_handlers");
        if let Some(seen) = self.events.clone() {
            context
                .add_event_callback("/test/event", Arc::new(Recorder { seen }), true)
                .await?;
        }
        Ok(())
    }

    async fn register_services(&mut self, context: &AppContext) -> Result<(), AppError> {
        self.record("register_services");
        let mut service = ServiceRegistrationInfo::new("/test/service");
        context
            .add_request_callback(
                &mut service,
                "/test/echo",
                Arc::new(Echo {
                    client: context.client(),
                }),
                true,
            )
            .await?;
        self.service_id = Some(service.service_id().to_string());
        context.register_service(service).await
    }

    async fn on_dxl_connect(&mut self, _context: &AppContext) -> Result<(), AppError> {
        self.record("on_dxl_connect");
        Ok(())
    }
}

#[tokio::test]
async fn test_run_invokes_hooks_in_order() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "[General]\ngreeting = \"hello\"\n");
    let calls = Arc::new(StdMutex::new(Vec::new()));
    let fabric = LocalFabric::new();

    let mut app = Application::new(
        TestHandler::new(Arc::clone(&calls)),
        dir.path(),
        APP_CONFIG_FILE,
        Arc::new(fabric.clone()),
    );
    app.run().await.unwrap();

    assert_eq!(
        *calls.lock().unwrap(),
        vec![
            "on_run",
            "on_load_configuration",
            "register_event_handlers",
            "register_services",
            "on_dxl_connect",
        ]
    );
    assert_eq!(app.handler().greeting.as_deref(), Some("hello"));
    assert!(app.is_running());
    assert_eq!(app.incoming_pool_settings(), PoolSettings::default());

    let err = app.run().await.unwrap_err();
    assert_eq!(err.to_string(), "The application is already running");

    app.destroy().await.unwrap();
}

#[tokio::test]
async fn test_missing_client_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(APP_CONFIG_FILE), "").unwrap();
    let calls = Arc::new(StdMutex::new(Vec::new()));

    let mut app = Application::new(
        TestHandler::new(Arc::clone(&calls)),
        dir.path(),
        APP_CONFIG_FILE,
        Arc::new(LocalFabric::new()),
    );
    let err = app.run().await.unwrap_err();
    assert!(matches!(err, AppError::ClientConfigAccess(_)));
    assert!(err.to_string().starts_with("Unable to access client configuration file:"));
    assert_eq!(*calls.lock().unwrap(), vec!["on_run"]);

    // nothing connected, destroy still succeeds
    app.destroy().await.unwrap();
}

#[tokio::test]
async fn test_missing_app_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "");
    fs::remove_file(dir.path().join(APP_CONFIG_FILE)).unwrap();

    let mut app = Application::new(
        TestHandler::new(Arc::new(StdMutex::new(Vec::new()))),
        dir.path(),
        APP_CONFIG_FILE,
        Arc::new(LocalFabric::new()),
    );
    let err = app.run().await.unwrap_err();
    assert!(matches!(err, AppError::AppConfigAccess(_)));
}

#[tokio::test]
async fn test_pool_settings_are_read_from_app_config() {
    let dir = tempfile::tempdir().unwrap();
    write_config(
        dir.path(),
        "[IncomingMessagePool]\nqueueSize = 20\nthreadCount = 2\n\n\
         [MessageCallbackPool]\nqueueSize = 5\nthreadCount = 3\n",
    );

    let mut app = Application::new(
        TestHandler::new(Arc::new(StdMutex::new(Vec::new()))),
        dir.path(),
        APP_CONFIG_FILE,
        Arc::new(LocalFabric::new()),
    );
    app.run().await.unwrap();

    assert_eq!(
        app.incoming_pool_settings(),
        PoolSettings {
            queue_size: 20,
            thread_count: 2
        }
    );
    assert_eq!(
        app.callback_pool_settings(),
        PoolSettings {
            queue_size: 5,
            thread_count: 3
        }
    );
    app.destroy().await.unwrap();
}

#[tokio::test]
async fn test_events_and_services_reach_handlers() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "");
    let fabric = LocalFabric::new();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut handler = TestHandler::new(Arc::new(StdMutex::new(Vec::new())));
    handler.events = Some(tx);
    let mut app = Application::new(
        handler,
        dir.path(),
        APP_CONFIG_FILE,
        Arc::new(fabric.clone()),
    );
    app.run().await.unwrap();

    let caller = fabric.client(Default::default());
    caller.connect().await.unwrap();

    let mut event = Message::event("/test/event");
    encode_payload(&mut event, "ping");
    caller.send_event(event).await.unwrap();
    let seen = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
    assert_eq!(seen.as_deref(), Some("ping"));

    let client = Client::new(caller.clone());
    let mut request = Message::request("/test/echo");
    encode_payload(&mut request, "hi");
    let response = client.sync_request(request).await.unwrap();
    assert_eq!(decode_payload(&response).unwrap(), "echo: hi");

    let context = Arc::clone(app.context().unwrap());
    let registered = context.registered_services().await;
    assert_eq!(registered, vec![app.handler().service_id.clone().unwrap()]);
    assert_eq!(fabric.service_count().await, 1);

    app.destroy().await.unwrap();
    assert_eq!(fabric.service_count().await, 0);
    assert!(!app.is_running());

    // second destroy is a no-op
    app.destroy().await.unwrap();
}

/// Holds the "block" event until the gate opens, then records it.
struct Gated {
    gate: Arc<Semaphore>,
    seen: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl EventCallback for Gated {
    async fn on_event(&self, event: Message) {
        let payload = decode_payload(&event).unwrap();
        if payload == "block" {
            let _permit = self.gate.acquire().await.unwrap();
        }
        let _ = self.seen.send(payload);
    }
}

struct GatedHandler {
    callback: Arc<Gated>,
    separate_thread: bool,
}

#[async_trait]
impl ApplicationHandler for GatedHandler {
    fn on_run(&mut self) -> Result<(), AppError> {
        Ok(())
    }

    fn on_load_configuration(&mut self, _config: &AppConfig) -> Result<(), AppError> {
        Ok(())
    }

    async fn register_event_handlers(&mut self, context: &AppContext) -> Result<(), AppError> {
        let callback: Arc<dyn EventCallback> = self.callback.clone();
        context
            .add_event_callback("/test/gated", callback, self.separate_thread)
            .await
    }

    async fn on_dxl_connect(&mut self, _context: &AppContext) -> Result<(), AppError> {
        Ok(())
    }
}

async fn run_gated(
    separate_thread: bool,
) -> (
    tempfile::TempDir,
    Application<GatedHandler>,
    LocalFabric,
    Arc<Semaphore>,
    mpsc::UnboundedReceiver<String>,
) {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "[IncomingMessagePool]\nthreadCount = 1\n");
    let fabric = LocalFabric::new();
    let gate = Arc::new(Semaphore::new(0));
    let (seen, rx) = mpsc::unbounded_channel();

    let handler = GatedHandler {
        callback: Arc::new(Gated {
            gate: Arc::clone(&gate),
            seen,
        }),
        separate_thread,
    };
    let mut app = Application::new(
        handler,
        dir.path(),
        APP_CONFIG_FILE,
        Arc::new(fabric.clone()),
    );
    app.run().await.unwrap();
    (dir, app, fabric, gate, rx)
}

async fn send_events(fabric: &LocalFabric, payloads: &[&str]) {
    let caller = fabric.client(Default::default());
    caller.connect().await.unwrap();
    for payload in payloads {
        let mut event = Message::event("/test/gated");
        encode_payload(&mut event, payload);
        caller.send_event(event).await.unwrap();
    }
}

#[tokio::test]
async fn test_separate_thread_callback_frees_incoming_pool() {
    let (_dir, mut app, fabric, gate, mut rx) = run_gated(true).await;
    send_events(&fabric, &["block", "next"]).await;

    let seen = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap();
    assert_eq!(seen.as_deref(), Some("next"));

    gate.add_permits(1);
    let seen = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap();
    assert_eq!(seen.as_deref(), Some("block"));

    let context = Arc::clone(app.context().unwrap());
    let pool = Arc::clone(context.callbacks_pool().unwrap());
    app.destroy().await.unwrap();
    let rejected = pool.add_task(Box::pin(async {})).await;
    assert!(matches!(rejected, Err(PoolError::Shutdown(_))));
}

#[tokio::test]
async fn test_inline_callback_blocks_incoming_pool() {
    let (_dir, mut app, fabric, gate, mut rx) = run_gated(false).await;
    send_events(&fabric, &["block", "next"]).await;

    let early = tokio::time::timeout(Duration::from_millis(300), rx.recv()).await;
    assert!(early.is_err(), "second event ran while the only worker was busy");

    gate.add_permits(1);
    let first = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap();
    let second = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap();
    assert_eq!(first.as_deref(), Some("block"));
    assert_eq!(second.as_deref(), Some("next"));

    assert!(app.context().unwrap().callbacks_pool().is_none());
    app.destroy().await.unwrap();
}
