//! Documents: snapshot, rendering, and delivery.

pub mod delivery;
pub mod render;
pub mod snapshot;

pub use delivery::{
    DeliveryError, DeliveryGateway, DeliveryReceipt, DeliveryRequest, DeliveryStatus,
    DisabledGateway, DocumentDispatcher,
};
pub use render::{DocumentRenderer, PdfRenderer, RenderError};
pub use snapshot::{
    DocumentKind, DocumentLine, DocumentSnapshot, delivery_message, document_file_name,
};
