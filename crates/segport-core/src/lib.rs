//! Desired-state reconciliation for NSX segment ports.
//!
//! Sits between a declarative front-end and `segport-api`:
//!
//! - **[`Reconciler`]**: owns one authenticated client and maps
//!   `(segment, port, desired state)` onto remote calls. Create and update
//!   are a PATCH followed by a read-back; delete is a read, a
//!   [`detach`] of the attachment binding, and a write.
//!
//! - **[`ReconcileRequest`] / [`Outcome`]**: the single-call contract the
//!   front-end uses. Missing ports come back as [`Outcome::Absent`], not
//!   as errors.
//!
//! - **[`ClientConfig`]**: endpoint, credentials and transport policy.
//!   The core never reads config files.

pub mod config;
pub mod detach;
pub mod error;
pub mod lookup;
pub mod operation;
pub mod reconciler;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ClientConfig, TlsVerification};
pub use detach::detach;
pub use error::CoreError;
pub use lookup::find_by_display_name;
pub use operation::{Operation, Outcome, ReconcileRequest};
pub use reconciler::Reconciler;

// Re-export the wire model so front-ends need only this crate.
pub use segport_api::{
    AddressBinding, AdminState, AttachmentType, Field, PortAttachment, SegmentPort,
    SegmentPortList, SegmentPortSpec,
};
