// Segment port wire model
//
// One shape serves both directions: `SegmentPortSpec` is what a caller
// submits, `SegmentPort` is what the server returns (the submitted fields plus
// server-computed paths and the resource type tag). Optional scalars are
// `Field<T>` so omitted and empty values survive a round trip.

use serde::{Deserialize, Serialize};

use crate::field::Field;

/// Resource type tag the policy API uses for segment ports.
pub const SEGMENT_PORT_RESOURCE_TYPE: &str = "SegmentPort";

/// Known values for [`PortAttachment::allocate_addresses`].
///
/// The API treats this as a free string, so the model does too.
pub mod allocate_addresses {
    pub const IP_POOL: &str = "IP_POOL";
    pub const MAC_POOL: &str = "MAC_POOL";
    pub const BOTH: &str = "BOTH";
    pub const DHCP: &str = "DHCP";
    pub const DHCPV6: &str = "DHCPV6";
    pub const SLAAC: &str = "SLAAC";
    pub const NONE: &str = "NONE";
}

// ── Enums ────────────────────────────────────────────────────────────

/// Administrative state of the port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AdminState {
    Up,
    Down,
}

/// How a workload is bound to the port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttachmentType {
    /// Primary VIF of a workload.
    Parent,
    /// Addressed sub-attachment carrying a VLAN traffic tag.
    Child,
}

// ── Records ──────────────────────────────────────────────────────────

/// One `{ip, mac, vlan}` entry of `address_bindings`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBinding {
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub ip_address: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub mac_address: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub vlan_id: Field<String>,
}

/// The `attachment` sub-record.
///
/// `allocate_addresses`, `app_id`, `context_id` and `traffic_tag` only mean
/// something when `attachment_type` is [`AttachmentType::Child`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortAttachment {
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub allocate_addresses: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub app_id: Field<String>,
    /// Attachment id of the PARENT port (CHILD only).
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub context_id: Field<String>,
    /// VIF id.
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub id: Field<String>,
    /// VLAN tag for CHILD traffic.
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub traffic_tag: Field<u32>,
    #[serde(default, rename = "type", skip_serializing_if = "Field::is_absent")]
    pub attachment_type: Field<AttachmentType>,
}

impl PortAttachment {
    pub fn is_child(&self) -> bool {
        self.attachment_type.as_value() == Some(&AttachmentType::Child)
    }
}

/// Desired state of a segment port, as sent in a PATCH body.
///
/// The segment and port identifiers of the URL are not part of this record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentPortSpec {
    /// `None` omits the key; `Some(vec![])` sends an empty list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_bindings: Option<Vec<AddressBinding>>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub admin_state: Field<AdminState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<PortAttachment>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub description: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub display_name: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub id: Field<String>,
}

/// A segment port as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentPort {
    #[serde(flatten)]
    pub spec: SegmentPortSpec,
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub parent_path: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub path: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub relative_path: Field<String>,
}

impl SegmentPort {
    /// Server-side identifier. Always present on a decoded record.
    pub fn id(&self) -> &str {
        self.spec.id.as_str().unwrap_or_default()
    }

    pub fn display_name(&self) -> Option<&str> {
        self.spec.display_name.as_str()
    }

    pub fn attachment_type(&self) -> Option<AttachmentType> {
        self.spec
            .attachment
            .as_ref()
            .and_then(|a| a.attachment_type.as_value().copied())
    }

    /// Drop the server-computed fields, keeping what can be submitted back.
    pub fn into_spec(self) -> SegmentPortSpec {
        self.spec
    }

    /// Check the invariants every observed record must satisfy.
    pub(crate) fn check_identity(&self) -> Result<(), String> {
        if !self.spec.id.is_value() {
            return Err("segment port is missing its `id`".into());
        }
        if self.resource_type.is_empty() {
            return Err("segment port has an empty `resource_type`".into());
        }
        Ok(())
    }
}

/// PATCH body: the desired record plus the fixed resource type tag.
#[derive(Debug, Serialize)]
pub(crate) struct SegmentPortBody<'a> {
    #[serde(flatten)]
    pub spec: &'a SegmentPortSpec,
    pub resource_type: &'static str,
}

impl<'a> From<&'a SegmentPortSpec> for SegmentPortBody<'a> {
    fn from(spec: &'a SegmentPortSpec) -> Self {
        Self {
            spec,
            resource_type: SEGMENT_PORT_RESOURCE_TYPE,
        }
    }
}

/// Response of `GET .../ports`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentPortList {
    /// In server order; never re-sorted.
    #[serde(default)]
    pub results: Vec<SegmentPort>,
    #[serde(default)]
    pub result_count: Option<u64>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_ascending: Option<bool>,
    /// Opaque pagination cursor, present when more pages exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}
