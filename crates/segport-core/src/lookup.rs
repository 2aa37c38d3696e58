// ── Display-name lookup ──
//
// Finds the port a workload owns by matching the start of its display
// name. Ports are usually named `<vm>-<nic>`, so the VM name is a prefix.

use segport_api::SegmentPort;

/// First port whose display name starts with `name`, ignoring case.
///
/// Walks `ports` in the order given (the server's order); the first hit
/// wins even if a later port matches more closely. Ports without a display
/// name never match. An empty `name` matches the first named port.
pub fn find_by_display_name<'a>(ports: &'a [SegmentPort], name: &str) -> Option<&'a SegmentPort> {
    let wanted = name.to_lowercase();
    ports.iter().find(|port| {
        port.display_name()
            .is_some_and(|display| display.to_lowercase().starts_with(&wanted))
    })
}
