// segport-api: Async Rust client for NSX policy segment ports
//
// Session login, request construction and response decoding for the
// `/policy/api/v1/infra/segments/{segment}/ports` resource family.

pub mod auth;
pub mod client;
pub mod error;
pub mod field;
pub mod models;
pub mod ports;
pub mod transport;

pub use auth::{Session, SessionCredentials};
pub use client::{RequestEditor, SegmentPortClient, decode};
pub use error::Error;
pub use field::Field;
pub use models::{
    AddressBinding, AdminState, AttachmentType, PortAttachment, SegmentPort, SegmentPortList,
    SegmentPortSpec,
};
pub use transport::{TlsMode, TransportConfig};
