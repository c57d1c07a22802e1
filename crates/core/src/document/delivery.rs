//! Best-effort document delivery.
//!
//! Delivery runs after the unit of work has committed. Nothing here can
//! fail the billing operation: every error becomes
//! [`DeliveryStatus::Failed`] and a warning in the log.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use super::render::{DocumentRenderer, RenderError};
use super::snapshot::{DocumentSnapshot, delivery_message, document_file_name};
use crate::company::{CompanyError, CompanyProfileCache};
use crate::records::TransactionRecord;
use crate::stock::StockPolicy;
use crate::storage::StorageError;

/// A rendered document ready to send.
#[derive(Debug, Clone)]
pub struct DeliveryRequest {
    /// PDF bytes.
    pub pdf: Vec<u8>,
    /// Storage folder, e.g. `invoice`.
    pub folder: String,
    /// Upload file name.
    pub file_name: String,
    /// Recipient phone number.
    pub recipient_phone: String,
    /// Message text.
    pub message: String,
}

/// Proof that the gateway accepted a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReceipt {
    /// Gateway message ID.
    pub message_id: String,
    /// Link to the uploaded document, if any.
    pub document_url: Option<String>,
}

/// Delivery failures. Never returned to API callers.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Delivery is switched off.
    #[error("Document delivery is disabled")]
    Disabled,

    /// Company profile could not be loaded.
    #[error(transparent)]
    Company(#[from] CompanyError),

    /// Rendering failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Upload failed.
    #[error("Document upload failed: {0}")]
    Storage(#[from] StorageError),

    /// The messaging gateway rejected or did not answer.
    #[error("Messaging gateway error: {0}")]
    Gateway(String),
}

/// Sends rendered documents to parties.
#[async_trait]
pub trait DeliveryGateway: Send + Sync {
    /// Sends one document.
    async fn send(&self, request: DeliveryRequest) -> Result<DeliveryReceipt, DeliveryError>;

    /// Returns false when sending is switched off.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Gateway used when delivery is not configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGateway;

#[async_trait]
impl DeliveryGateway for DisabledGateway {
    async fn send(&self, _request: DeliveryRequest) -> Result<DeliveryReceipt, DeliveryError> {
        Err(DeliveryError::Disabled)
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Result of the delivery attempt attached to every mutation outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// The gateway accepted the document.
    Sent {
        /// Gateway message ID.
        message_id: String,
        /// Link to the uploaded document.
        document_url: Option<String>,
    },
    /// Rendering, upload, or sending failed. The transaction is committed.
    Failed {
        /// What went wrong.
        reason: String,
    },
    /// Delivery is switched off.
    Disabled,
}

impl DeliveryStatus {
    /// Returns true if the document was sent.
    #[must_use]
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }
}

/// Renders and sends the document of a committed record.
#[derive(Clone)]
pub struct DocumentDispatcher {
    renderer: Arc<dyn DocumentRenderer>,
    gateway: Arc<dyn DeliveryGateway>,
    company: CompanyProfileCache,
    policy: StockPolicy,
}

impl DocumentDispatcher {
    /// Create a new dispatcher.
    #[must_use]
    pub fn new(
        renderer: Arc<dyn DocumentRenderer>,
        gateway: Arc<dyn DeliveryGateway>,
        company: CompanyProfileCache,
        policy: StockPolicy,
    ) -> Self {
        Self {
            renderer,
            gateway,
            company,
            policy,
        }
    }

    /// Dispatcher that never sends anything.
    #[must_use]
    pub fn disabled(company: CompanyProfileCache, policy: StockPolicy) -> Self {
        Self::new(
            Arc::new(super::render::PdfRenderer),
            Arc::new(DisabledGateway),
            company,
            policy,
        )
    }

    /// The company profile cache, for invalidation.
    #[must_use]
    pub fn company(&self) -> &CompanyProfileCache {
        &self.company
    }

    /// Renders and sends the document for `record`.
    pub async fn dispatch(&self, record: &TransactionRecord, balance_after: Decimal) -> DeliveryStatus {
        if !self.gateway.is_enabled() {
            return DeliveryStatus::Disabled;
        }

        match self.try_dispatch(record, balance_after).await {
            Ok(receipt) => {
                info!(
                    kind = %record.kind,
                    reference_no = %record.reference_no,
                    message_id = %receipt.message_id,
                    "Document delivered"
                );
                DeliveryStatus::Sent {
                    message_id: receipt.message_id,
                    document_url: receipt.document_url,
                }
            }
            Err(err) => {
                warn!(
                    kind = %record.kind,
                    reference_no = %record.reference_no,
                    error = %err,
                    "Document delivery failed"
                );
                DeliveryStatus::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }

    async fn try_dispatch(
        &self,
        record: &TransactionRecord,
        balance_after: Decimal,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let company = self.company.profile().await?;
        let snapshot = DocumentSnapshot::new(record, &company, balance_after, &self.policy);
        let pdf = self.renderer.render(&snapshot)?;

        self.gateway
            .send(DeliveryRequest {
                pdf,
                folder: snapshot.kind.stem().to_string(),
                file_name: document_file_name(&snapshot),
                recipient_phone: snapshot.party_phone.clone(),
                message: delivery_message(&snapshot),
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;
    use std::sync::Mutex;
    use tally_shared::config::CompanyConfig;
    use tally_shared::types::{PartyId, TransactionId};

    use crate::records::{PaymentDirection, TransactionKind};

    struct StubRenderer;

    impl DocumentRenderer for StubRenderer {
        fn render(&self, _snapshot: &DocumentSnapshot) -> Result<Vec<u8>, RenderError> {
            Ok(b"%PDF".to_vec())
        }
    }

    struct BrokenRenderer;

    impl DocumentRenderer for BrokenRenderer {
        fn render(&self, _snapshot: &DocumentSnapshot) -> Result<Vec<u8>, RenderError> {
            Err(RenderError::Pdf("font missing".into()))
        }
    }

    #[derive(Default)]
    struct CapturingGateway {
        sent: Mutex<Vec<DeliveryRequest>>,
    }

    #[async_trait]
    impl DeliveryGateway for CapturingGateway {
        async fn send(&self, request: DeliveryRequest) -> Result<DeliveryReceipt, DeliveryError> {
            self.sent.lock().unwrap().push(request);
            Ok(DeliveryReceipt {
                message_id: "msg-1".into(),
                document_url: Some("https://files.local/receipt.pdf".into()),
            })
        }
    }

    fn payment() -> TransactionRecord {
        let now = Utc::now();
        TransactionRecord {
            id: TransactionId::new(),
            kind: TransactionKind::Payment,
            reference_no: "PAY-000001".into(),
            party_id: PartyId::new(),
            party_name: "Acme".into(),
            party_phone: "9000000001".into(),
            date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            direction: Some(PaymentDirection::PaymentIn),
            lines: Vec::new(),
            total_amount: dec!(400),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn dispatcher(
        renderer: Arc<dyn DocumentRenderer>,
        gateway: Arc<dyn DeliveryGateway>,
    ) -> DocumentDispatcher {
        DocumentDispatcher::new(
            renderer,
            gateway,
            CompanyProfileCache::from_config(&CompanyConfig::default()),
            StockPolicy::default(),
        )
    }

    #[tokio::test]
    async fn test_disabled_dispatcher_sends_nothing() {
        let dispatcher = DocumentDispatcher::disabled(
            CompanyProfileCache::from_config(&CompanyConfig::default()),
            StockPolicy::default(),
        );
        assert_eq!(
            dispatcher.dispatch(&payment(), dec!(500)).await,
            DeliveryStatus::Disabled
        );
    }

    #[tokio::test]
    async fn test_sent_receipt_reaches_party_phone() {
        let gateway = Arc::new(CapturingGateway::default());
        let status = dispatcher(Arc::new(StubRenderer), gateway.clone())
            .dispatch(&payment(), dec!(500))
            .await;

        assert!(status.is_sent());
        let sent = gateway.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient_phone, "9000000001");
        assert_eq!(sent[0].folder, "receipt");
        assert_eq!(sent[0].file_name, "receipt-PAY-000001.pdf");
        assert!(sent[0].message.contains("Previous balance: 900"));
    }

    #[tokio::test]
    async fn test_render_failure_becomes_failed_status() {
        let gateway = Arc::new(CapturingGateway::default());
        let status = dispatcher(Arc::new(BrokenRenderer), gateway.clone())
            .dispatch(&payment(), dec!(500))
            .await;

        assert_eq!(
            status,
            DeliveryStatus::Failed {
                reason: "PDF rendering failed: font missing".into()
            }
        );
        assert!(gateway.sent.lock().unwrap().is_empty());
    }
}
