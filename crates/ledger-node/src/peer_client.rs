use ledger_core::{ChainReport, ChainSource, PeerError};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Fetches peer chains over `GET http://{authority}/get_chain`.
#[derive(Clone, Debug)]
pub struct HttpChainSource {
    http: Client,
}

impl HttpChainSource {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

impl ChainSource for HttpChainSource {
    async fn fetch_chain(&self, authority: &str) -> Result<ChainReport, PeerError> {
        let url = format!("http://{authority}/get_chain");
        debug!(%url, "fetching peer chain");
        let resp = self.http.get(&url).send().await.map_err(|e| PeerError::Fetch {
            peer: authority.to_string(),
            reason: e.to_string(),
        })?;
        if resp.status() != StatusCode::OK {
            return Err(PeerError::Status {
                peer: authority.to_string(),
                status: resp.status().as_u16(),
            });
        }
        resp.json::<ChainReport>().await.map_err(|e| PeerError::Malformed {
            peer: authority.to_string(),
            reason: e.to_string(),
        })
    }
}
