//! Error types for the support library.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("pool '{0}' has been shut down")]
    Shutdown(String),
}

#[derive(Debug, Error)]
pub enum FabricError {
    #[error("client {0} is not connected to the fabric")]
    NotConnected(String),
    #[error("timeout waiting for response to request {message_id} after {timeout:?}")]
    Timeout { message_id: String, timeout: Duration },
    #[error("unknown service: {0}")]
    UnknownService(String),
    #[error("topic {topic} is already handled by service {service_id}")]
    TopicInUse { topic: String, service_id: String },
    #[error("response channel closed for request {0}")]
    ResponseDropped(String),
    #[error(transparent)]
    Pool(#[from] PoolError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {details}")]
    Parse { path: PathBuf, details: String },
    #[error("invalid broker entry '{entry}': {reason}")]
    Broker { entry: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Response timeout must be greater than or equal to {min}")]
    ResponseTimeoutTooSmall { min: u64 },
    #[error("Error: {message} ({code})")]
    ErrorResponse { message: String, code: i32 },
    #[error(transparent)]
    Fabric(#[from] FabricError),
    #[error(transparent)]
    Message(#[from] MessageError),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("The application is already running")]
    AlreadyRunning,
    #[error("The application is not connected to the fabric")]
    NotConnected,
    #[error("Unable to access client configuration file: {0}")]
    ClientConfigAccess(PathBuf),
    #[error("Unable to access application configuration file: {0}")]
    AppConfigAccess(PathBuf),
    #[error("Error attempting to read application configuration file: {path}: {details}")]
    AppConfigRead { path: PathBuf, details: String },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Fabric(#[from] FabricError),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Message(#[from] MessageError),
    #[error("{0}")]
    Handler(String),
}
