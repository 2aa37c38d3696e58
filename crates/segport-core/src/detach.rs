// ── Detach transform ──
//
// The policy API has no destructive delete for attached segment ports.
// "Deleting" one means writing it back with its attachment binding
// cleared. This module is the pure half of that: no I/O, just the
// field-clearing rule keyed on the attachment type.
//
// A PATCH leaves omitted keys untouched, so cleared fields must be sent
// explicitly: strings as `""`, the VLAN tag as `0`.

use segport_api::{AttachmentType, Field, SegmentPortSpec};

/// Clear the attachment binding of a port's current state.
///
/// - CHILD: `allocate_addresses`, `app_id`, `context_id` and `traffic_tag`
///   are cleared along with the type.
/// - PARENT, unset or empty type: only the type is cleared.
///
/// Cleared strings become `Empty` and encode as `""`; a cleared
/// `traffic_tag` encodes as `0`. Everything else (bindings, names, the VIF
/// id) is carried over as-is.
pub fn detach(mut spec: SegmentPortSpec) -> SegmentPortSpec {
    if let Some(attachment) = spec.attachment.as_mut() {
        if attachment.is_child() {
            attachment.allocate_addresses = Field::Empty;
            attachment.app_id = Field::Empty;
            attachment.context_id = Field::Empty;
            attachment.traffic_tag = Field::Value(0);
        }
        attachment.attachment_type = Field::Empty;
    }
    spec
}
