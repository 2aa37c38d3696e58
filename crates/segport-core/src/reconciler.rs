// ── Reconciler ──
//
// Per-call orchestration between desired and observed state. Holds the
// authenticated client and nothing else: no resource state survives a
// call, and no call is retried.

use segport_api::{SegmentPort, SegmentPortClient, SegmentPortList, SegmentPortSpec};
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::detach::detach;
use crate::error::CoreError;
use crate::lookup::find_by_display_name;
use crate::operation::{Operation, Outcome, ReconcileRequest};

/// Reconciles segment ports on one NSX manager.
///
/// Cheap to share behind an `Arc`: every method takes `&self`, and the
/// only mutable state is the session credentials, which the client swaps
/// atomically on re-authentication.
pub struct Reconciler {
    config: ClientConfig,
    client: SegmentPortClient,
}

impl Reconciler {
    /// Normalize the endpoint, build the transport and log in.
    ///
    /// With `strict_auth`, a login that returns 200 without both a session
    /// cookie and an XSRF token is rejected here.
    pub async fn connect(config: ClientConfig) -> Result<Self, CoreError> {
        let transport = config.transport();
        let base_url = transport.normalize_endpoint(&config.endpoint)?;
        let client = SegmentPortClient::new(base_url, &transport)?;

        let reconciler = Self { config, client };
        reconciler.login().await?;
        info!(endpoint = %reconciler.client.base_url(), "connected to NSX manager");
        Ok(reconciler)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The underlying API client.
    pub fn client(&self) -> &SegmentPortClient {
        &self.client
    }

    /// Run the login exchange again, replacing the session credentials.
    pub async fn reauthenticate(&self) -> Result<(), CoreError> {
        self.login().await
    }

    async fn login(&self) -> Result<(), CoreError> {
        let credentials = self
            .client
            .authenticate(&self.config.username, &self.config.password)
            .await?;

        if self.config.strict_auth && !credentials.is_complete() {
            return Err(CoreError::AuthenticationFailed {
                status: Some(200),
                message: "login response carried no session cookie or XSRF token".into(),
            });
        }
        Ok(())
    }

    // ── Inbound contract ─────────────────────────────────────────────

    /// Dispatch one reconcile request.
    ///
    /// A missing port is not an error here: `Read` and `Lookup` report it
    /// as [`Outcome::Absent`], and so does `Delete` when there was nothing
    /// to detach.
    pub async fn reconcile(&self, request: ReconcileRequest) -> Result<Outcome, CoreError> {
        let ReconcileRequest {
            segment_id,
            port_id,
            operation,
        } = request;
        debug!(
            operation = operation.name(),
            segment_id,
            port_id = port_id.as_deref().unwrap_or_default(),
            "reconcile"
        );

        let port_id = match (operation.needs_port_id(), port_id) {
            (true, Some(port_id)) => port_id,
            (true, None) => {
                return Err(CoreError::InvalidInput {
                    message: format!("operation '{}' requires a port_id", operation.name()),
                });
            }
            (false, _) => String::new(),
        };

        match operation {
            Operation::List => self.list(&segment_id).await.map(Outcome::Listed),
            Operation::Lookup { display_name } => Ok(self
                .lookup(&segment_id, &display_name)
                .await?
                .map_or(Outcome::Absent, Outcome::Observed)),
            Operation::Read => match self.get(&segment_id, &port_id).await {
                Ok(port) => Ok(Outcome::Observed(port)),
                Err(e) if e.is_not_found() => Ok(Outcome::Absent),
                Err(e) => Err(e),
            },
            Operation::CreateOrUpdate(desired) => self
                .create_or_update(&segment_id, &port_id, &desired)
                .await
                .map(Outcome::Observed),
            Operation::Delete => Ok(self
                .delete(&segment_id, &port_id)
                .await?
                .map_or(Outcome::Absent, Outcome::Detached)),
        }
    }

    // ── Operations ───────────────────────────────────────────────────

    /// All ports of a segment, in server order.
    pub async fn list(&self, segment_id: &str) -> Result<SegmentPortList, CoreError> {
        Ok(self.client.list_segment_ports(segment_id).await?)
    }

    /// First port whose display name starts with `display_name`.
    ///
    /// `Ok(None)` when nothing matches; the caller treats it as not found.
    pub async fn lookup(
        &self,
        segment_id: &str,
        display_name: &str,
    ) -> Result<Option<SegmentPort>, CoreError> {
        let list = self.list(segment_id).await?;
        let found = find_by_display_name(&list.results, display_name).cloned();
        debug!(
            segment_id,
            display_name,
            found = found.is_some(),
            "looked up segment port by display name"
        );
        Ok(found)
    }

    /// Current state of one port, or [`CoreError::NotFound`].
    pub async fn get(&self, segment_id: &str, port_id: &str) -> Result<SegmentPort, CoreError> {
        Ok(self.client.get_segment_port(segment_id, port_id).await?)
    }

    /// Submit `desired` as a full replace, then read the port back so the
    /// result carries server-computed fields (paths, resource type).
    pub async fn create_or_update(
        &self,
        segment_id: &str,
        port_id: &str,
        desired: &SegmentPortSpec,
    ) -> Result<SegmentPort, CoreError> {
        self.client
            .patch_segment_port(segment_id, port_id, desired)
            .await?;
        let observed = self.get(segment_id, port_id).await?;
        debug!(
            segment_id,
            port_id,
            path = observed.path.as_str().unwrap_or_default(),
            "segment port written"
        );
        Ok(observed)
    }

    /// Detach a port: read it, clear its attachment binding, write it back.
    ///
    /// Returns `Ok(None)` if the port was already gone. Any other failure
    /// of the read aborts before anything is written.
    pub async fn delete(
        &self,
        segment_id: &str,
        port_id: &str,
    ) -> Result<Option<SegmentPort>, CoreError> {
        let current = match self.get(segment_id, port_id).await {
            Ok(port) => port,
            Err(e) if e.is_not_found() => {
                debug!(segment_id, port_id, "segment port already absent");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let detached = detach(current.into_spec());
        let observed = self
            .create_or_update(segment_id, port_id, &detached)
            .await?;
        info!(segment_id, port_id, "segment port detached");
        Ok(Some(observed))
    }
}
