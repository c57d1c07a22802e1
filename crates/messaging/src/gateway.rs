//! Messaging gateway over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tally_core::document::{DeliveryError, DeliveryGateway, DeliveryReceipt, DeliveryRequest};
use tally_core::storage::{StorageConfig, StorageService};
use tally_shared::config::DeliveryConfig;
use tracing::{debug, info};

use crate::error::MessagingError;

#[derive(Debug, Serialize)]
struct OutboundMessage<'a> {
    to: &'a str,
    message: &'a str,
    file_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    document_url: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct GatewayResponse {
    #[serde(alias = "id")]
    message_id: String,
}

/// Posts document messages to an HTTP messaging API.
pub struct HttpDeliveryGateway {
    client: Client,
    endpoint: String,
    api_token: Option<String>,
    storage: Option<StorageService>,
}

impl HttpDeliveryGateway {
    /// Creates a gateway.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        api_token: Option<String>,
        timeout: Duration,
        storage: Option<StorageService>,
    ) -> Result<Self, MessagingError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_token,
            storage,
        })
    }

    /// Builds a gateway from the `delivery` config section.
    ///
    /// # Errors
    ///
    /// Returns an error if no endpoint is set or storage cannot be initialized.
    pub fn from_config(config: &DeliveryConfig) -> Result<Self, MessagingError> {
        let endpoint = config
            .endpoint
            .clone()
            .filter(|e| !e.trim().is_empty())
            .ok_or(MessagingError::MissingEndpoint)?;

        let storage = config
            .storage
            .clone()
            .map(|provider| {
                let storage = StorageConfig::new(provider).with_link_ttl(config.link_ttl_secs);
                info!(provider = storage.provider_name(), "Document storage configured");
                StorageService::from_config(storage)
            })
            .transpose()?;

        Self::new(
            endpoint,
            config.api_token.clone(),
            Duration::from_secs(config.timeout_secs),
            storage,
        )
    }

    async fn upload(&self, request: &DeliveryRequest) -> Result<Option<String>, DeliveryError> {
        let Some(storage) = &self.storage else {
            return Ok(None);
        };
        let key = StorageService::document_key(&request.folder, &request.file_name);
        let size = storage.upload_document(&key, request.pdf.clone()).await?;
        debug!(%key, size, "Document uploaded");
        Ok(Some(storage.document_url(&key).await?))
    }
}

/// Keeps digits and a leading `+`.
fn normalize_phone(phone: &str) -> String {
    phone
        .trim()
        .chars()
        .enumerate()
        .filter(|(i, c)| c.is_ascii_digit() || (*i == 0 && *c == '+'))
        .map(|(_, c)| c)
        .collect()
}

#[async_trait]
impl DeliveryGateway for HttpDeliveryGateway {
    async fn send(&self, request: DeliveryRequest) -> Result<DeliveryReceipt, DeliveryError> {
        let to = normalize_phone(&request.recipient_phone);
        if to.is_empty() {
            return Err(DeliveryError::Gateway(
                "recipient phone number is empty".to_string(),
            ));
        }

        let document_url = self.upload(&request).await?;

        let body = OutboundMessage {
            to: &to,
            message: &request.message,
            file_name: &request.file_name,
            document_url: document_url.as_deref(),
        };

        let mut call = self.client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.api_token {
            call = call.bearer_auth(token);
        }

        let response = call
            .send()
            .await
            .map_err(|e| DeliveryError::Gateway(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Gateway(format!(
                "gateway returned {status}: {text}"
            )));
        }

        let parsed: GatewayResponse = response
            .json()
            .await
            .map_err(|e| DeliveryError::Gateway(format!("unreadable gateway response: {e}")))?;

        info!(to = %to, message_id = %parsed.message_id, "Document message sent");

        Ok(DeliveryReceipt {
            message_id: parsed.message_id,
            document_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use tally_shared::config::StorageProviderConfig;

    use super::*;

    #[derive(Clone, Default)]
    struct Captured {
        bodies: Arc<Mutex<Vec<Value>>>,
        auth: Arc<Mutex<Vec<Option<String>>>>,
    }

    async fn accept(
        State(captured): State<Captured>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        captured.auth.lock().unwrap().push(auth);
        captured.bodies.lock().unwrap().push(body);
        Json(json!({ "message_id": "msg-42" }))
    }

    async fn reject() -> (StatusCode, &'static str) {
        (StatusCode::SERVICE_UNAVAILABLE, "try later")
    }

    async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn request(phone: &str) -> DeliveryRequest {
        DeliveryRequest {
            pdf: b"%PDF-1.3 test".to_vec(),
            folder: "invoice".to_string(),
            file_name: "invoice-INV-1.pdf".to_string(),
            recipient_phone: phone.to_string(),
            message: "Dear Acme, please find invoice INV-1".to_string(),
        }
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone(" +91 90000-00001 "), "+919000000001");
        assert_eq!(normalize_phone("90+00"), "9000");
        assert_eq!(normalize_phone("n/a"), "");
    }

    #[test]
    fn test_from_config_requires_endpoint() {
        let config = DeliveryConfig {
            enabled: true,
            ..DeliveryConfig::default()
        };
        assert!(matches!(
            HttpDeliveryGateway::from_config(&config),
            Err(MessagingError::MissingEndpoint)
        ));
    }

    #[tokio::test]
    async fn test_send_posts_message_with_bearer_token() {
        let captured = Captured::default();
        let app = Router::new()
            .route("/messages", post(accept))
            .with_state(captured.clone());
        let addr = serve(app).await;

        let gateway = HttpDeliveryGateway::new(
            format!("http://{addr}/messages"),
            Some("secret".to_string()),
            Duration::from_secs(5),
            None,
        )
        .unwrap();

        let receipt = gateway.send(request("9000000001")).await.unwrap();
        assert_eq!(receipt.message_id, "msg-42");
        assert_eq!(receipt.document_url, None);

        let bodies = captured.bodies.lock().unwrap();
        assert_eq!(bodies[0]["to"], "9000000001");
        assert_eq!(bodies[0]["file_name"], "invoice-INV-1.pdf");
        assert!(bodies[0].get("document_url").is_none());
        assert_eq!(
            captured.auth.lock().unwrap()[0].as_deref(),
            Some("Bearer secret")
        );
    }

    #[tokio::test]
    async fn test_send_uploads_document_first() {
        let captured = Captured::default();
        let app = Router::new()
            .route("/messages", post(accept))
            .with_state(captured.clone());
        let addr = serve(app).await;

        let root = std::env::temp_dir().join(format!("tally-gateway-{}", uuid::Uuid::new_v4()));
        let storage = StorageService::from_config(StorageConfig::new(
            StorageProviderConfig::LocalFs {
                root: root.clone(),
                public_base_url: Some("https://files.example.com/".to_string()),
            },
        ))
        .unwrap();

        let gateway = HttpDeliveryGateway::new(
            format!("http://{addr}/messages"),
            None,
            Duration::from_secs(5),
            Some(storage),
        )
        .unwrap();

        let receipt = gateway.send(request("9000000001")).await.unwrap();
        let url = "https://files.example.com/documents/invoice/invoice-INV-1.pdf";
        assert_eq!(receipt.document_url.as_deref(), Some(url));
        assert_eq!(captured.bodies.lock().unwrap()[0]["document_url"], url);
        assert_eq!(captured.auth.lock().unwrap()[0], None);
        assert!(root.join("documents/invoice/invoice-INV-1.pdf").exists());

        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn test_gateway_error_status_is_reported() {
        let addr = serve(Router::new().route("/messages", post(reject))).await;
        let gateway = HttpDeliveryGateway::new(
            format!("http://{addr}/messages"),
            None,
            Duration::from_secs(5),
            None,
        )
        .unwrap();

        let err = gateway.send(request("9000000001")).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Gateway(ref msg) if msg.contains("503")));
    }

    #[tokio::test]
    async fn test_empty_phone_is_rejected_without_calling() {
        let gateway = HttpDeliveryGateway::new(
            "http://127.0.0.1:9/messages",
            None,
            Duration::from_secs(1),
            None,
        )
        .unwrap();
        let err = gateway.send(request("  ")).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Gateway(_)));
    }
}
