// Segment port endpoints
//
// `GET    /policy/api/v1/infra/segments/{segment}/ports`
// `GET    /policy/api/v1/infra/segments/{segment}/ports/{port}`
// `PATCH  /policy/api/v1/infra/segments/{segment}/ports/{port}`
// `DELETE /policy/api/v1/infra/segments/{segment}/ports/{port}`

use reqwest::{Method, Request, StatusCode};
use tracing::debug;

use crate::client::{SegmentPortClient, decode};
use crate::error::Error;
use crate::models::{SegmentPort, SegmentPortBody, SegmentPortList, SegmentPortSpec};

impl SegmentPortClient {
    // ── Request builders ─────────────────────────────────────────────

    pub fn list_request(&self, segment_id: &str) -> Result<Request, Error> {
        let url = self.ports_url(segment_id, None)?;
        self.build_request(Method::GET, url, None)
    }

    pub fn get_request(&self, segment_id: &str, port_id: &str) -> Result<Request, Error> {
        let url = self.ports_url(segment_id, Some(port_id))?;
        self.build_request(Method::GET, url, None)
    }

    /// PATCH with the desired record as the JSON body.
    pub fn patch_request(
        &self,
        segment_id: &str,
        port_id: &str,
        spec: &SegmentPortSpec,
    ) -> Result<Request, Error> {
        let url = self.ports_url(segment_id, Some(port_id))?;
        let body = serde_json::to_vec(&SegmentPortBody::from(spec)).map_err(|e| {
            Error::InvalidInput {
                message: format!("segment port body could not be encoded: {e}"),
            }
        })?;
        self.build_request(Method::PATCH, url, Some(body))
    }

    pub fn delete_request(&self, segment_id: &str, port_id: &str) -> Result<Request, Error> {
        let url = self.ports_url(segment_id, Some(port_id))?;
        self.build_request(Method::DELETE, url, None)
    }

    // ── Calls ────────────────────────────────────────────────────────

    /// List the ports of a segment, in server order.
    pub async fn list_segment_ports(&self, segment_id: &str) -> Result<SegmentPortList, Error> {
        debug!(segment_id, "listing segment ports");
        let request = self.list_request(segment_id)?;
        let (status, body) = self.execute(request).await?;
        let list: SegmentPortList = decode(status, &body)?;
        for port in &list.results {
            port.check_identity()
                .map_err(|message| deserialization(message, &body))?;
        }
        Ok(list)
    }

    /// Fetch one port. HTTP 404 becomes [`Error::NotFound`].
    pub async fn get_segment_port(
        &self,
        segment_id: &str,
        port_id: &str,
    ) -> Result<SegmentPort, Error> {
        debug!(segment_id, port_id, "reading segment port");
        let request = self.get_request(segment_id, port_id)?;
        let (status, body) = self.execute(request).await?;
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound {
                segment_id: segment_id.to_owned(),
                port_id: port_id.to_owned(),
            });
        }
        let port: SegmentPort = decode(status, &body)?;
        port.check_identity()
            .map_err(|message| deserialization(message, &body))?;
        Ok(port)
    }

    /// Create or replace a port. The response body is not interpreted;
    /// read the port back for the server's canonical view.
    pub async fn patch_segment_port(
        &self,
        segment_id: &str,
        port_id: &str,
        spec: &SegmentPortSpec,
    ) -> Result<(), Error> {
        debug!(segment_id, port_id, "patching segment port");
        let request = self.patch_request(segment_id, port_id, spec)?;
        let (status, body) = self.execute(request).await?;
        expect_ok(status, body)
    }

    /// Issue a raw DELETE.
    ///
    /// The manager refuses this for ports that still carry an attachment;
    /// detach through [`patch_segment_port`](Self::patch_segment_port) first.
    pub async fn delete_segment_port(&self, segment_id: &str, port_id: &str) -> Result<(), Error> {
        debug!(segment_id, port_id, "deleting segment port");
        let request = self.delete_request(segment_id, port_id)?;
        let (status, body) = self.execute(request).await?;
        match status {
            StatusCode::NOT_FOUND => Err(Error::NotFound {
                segment_id: segment_id.to_owned(),
                port_id: port_id.to_owned(),
            }),
            _ => expect_ok(status, body),
        }
    }
}

fn expect_ok(status: StatusCode, body: String) -> Result<(), Error> {
    if status == StatusCode::OK {
        Ok(())
    } else {
        Err(Error::Api {
            status: status.as_u16(),
            body,
        })
    }
}

fn deserialization(message: String, body: &str) -> Error {
    Error::Deserialization {
        message,
        body: body.to_owned(),
    }
}
