//! Document delivery over a messaging HTTP API.
//!
//! [`HttpDeliveryGateway`] uploads the rendered PDF to object storage when
//! one is configured and posts a message carrying the document link to the
//! configured endpoint.

mod error;
mod gateway;

pub use error::MessagingError;
pub use gateway::HttpDeliveryGateway;
