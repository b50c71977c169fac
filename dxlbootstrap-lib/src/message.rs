//! Messages exchanged over the fabric.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    Request,
    Response,
    Event,
    Error,
}

/// A single fabric message.
///
/// Responses and error responses carry the id of the request they answer in
/// `request_message_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_type: MessageType,
    pub message_id: String,
    pub topic: String,
    pub payload: Vec<u8>,
    pub request_message_id: Option<String>,
    pub service_id: Option<String>,
    pub source_client_id: Option<String>,
    pub error_code: i32,
    pub error_message: String,
}

impl Message {
    fn new(message_type: MessageType, topic: impl Into<String>) -> Self {
        Self {
            message_type,
            message_id: Uuid::new_v4().to_string(),
            topic: topic.into(),
            payload: Vec::new(),
            request_message_id: None,
            service_id: None,
            source_client_id: None,
            error_code: 0,
            error_message: String::new(),
        }
    }

    pub fn request(topic: impl Into<String>) -> Self {
        Self::new(MessageType::Request, topic)
    }

    pub fn event(topic: impl Into<String>) -> Self {
        Self::new(MessageType::Event, topic)
    }

    /// Creates an (empty) response to `request`.
    pub fn response_to(request: &Message) -> Self {
        let mut response = Self::new(MessageType::Response, request.topic.clone());
        response.request_message_id = Some(request.message_id.clone());
        response.service_id.clone_from(&request.service_id);
        response
    }

    /// Creates an error response to `request`.
    pub fn error_response_to(request: &Message, code: i32, message: impl Into<String>) -> Self {
        let mut response = Self::response_to(request);
        response.message_type = MessageType::Error;
        response.error_code = code;
        response.error_message = message.into();
        response
    }

    pub fn is_error(&self) -> bool {
        self.message_type == MessageType::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_references_request() {
        let mut request = Message::request("/mycompany/service/lookup");
        request.service_id = Some("svc-1".to_string());

        let response = Message::response_to(&request);
        assert_eq!(response.message_type, MessageType::Response);
        assert_eq!(response.request_message_id.as_deref(), Some(request.message_id.as_str()));
        assert_eq!(response.service_id.as_deref(), Some("svc-1"));
        assert_ne!(response.message_id, request.message_id);
    }

    #[test]
    fn test_error_response() {
        let request = Message::request("/a");
        let error = Message::error_response_to(&request, 42, "boom");
        assert!(error.is_error());
        assert_eq!(error.error_code, 42);
        assert_eq!(error.error_message, "boom");
    }
}
