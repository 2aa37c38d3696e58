// ── Reconcile contract ──
//
// The declarative front-end drives the core through one entry point:
// `Reconciler::reconcile(request)`. Each request names a segment, an
// optional port and an operation; the outcome is the observed state the
// front-end should persist.

use segport_api::{SegmentPort, SegmentPortList, SegmentPortSpec};
use serde::Serialize;

/// What to do to a segment port.
#[derive(Debug, Clone)]
pub enum Operation {
    /// All ports of the segment, in server order.
    List,
    /// First port whose display name starts with `display_name` (case-insensitive).
    Lookup { display_name: String },
    /// Current state of one port.
    Read,
    /// Replace one port with the desired state.
    CreateOrUpdate(SegmentPortSpec),
    /// Detach one port (the API has no destructive delete).
    Delete,
}

impl Operation {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Lookup { .. } => "lookup",
            Self::Read => "read",
            Self::CreateOrUpdate(_) => "create_or_update",
            Self::Delete => "delete",
        }
    }

    /// Whether the operation addresses a single port.
    pub fn needs_port_id(&self) -> bool {
        matches!(self, Self::Read | Self::CreateOrUpdate(_) | Self::Delete)
    }
}

/// One reconcile call.
#[derive(Debug, Clone)]
pub struct ReconcileRequest {
    pub segment_id: String,
    pub port_id: Option<String>,
    pub operation: Operation,
}

impl ReconcileRequest {
    pub fn new(segment_id: impl Into<String>, operation: Operation) -> Self {
        Self {
            segment_id: segment_id.into(),
            port_id: None,
            operation,
        }
    }

    pub fn port(mut self, port_id: impl Into<String>) -> Self {
        self.port_id = Some(port_id.into());
        self
    }
}

/// Result of a reconcile call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "state", rename_all = "snake_case")]
pub enum Outcome {
    /// The segment's ports with list metadata.
    Listed(SegmentPortList),
    /// Server state of the port after a read or write.
    Observed(SegmentPort),
    /// The port does not exist, or a lookup found no match. The front-end
    /// drops the resource from its state.
    Absent,
    /// The port was detached; carries its state afterwards.
    Detached(SegmentPort),
}

impl Outcome {
    /// The single observed record, if the outcome has one.
    pub fn observed(&self) -> Option<&SegmentPort> {
        match self {
            Self::Observed(port) | Self::Detached(port) => Some(port),
            Self::Listed(_) | Self::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}
