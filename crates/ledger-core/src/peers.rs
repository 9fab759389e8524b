use crate::error::PeerError;
use std::collections::BTreeSet;
use url::{Position, Url};

/// Known peers, stored as `host[:port]` authorities.
///
/// Kept sorted so that every pass over the registry visits peers in the same order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PeerRegistry {
    nodes: BTreeSet<String>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `address` and records its authority. Returns `false` if it was already known.
    pub fn add(&mut self, address: &str) -> Result<bool, PeerError> {
        let authority = authority_of(address)?;
        Ok(self.nodes.insert(authority))
    }

    /// Adds every address or none of them. Returns how many were new.
    pub fn extend<I, S>(&mut self, addresses: I) -> Result<usize, PeerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parsed = addresses
            .into_iter()
            .map(|address| authority_of(address.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parsed.into_iter().filter(|a| self.nodes.insert(a.clone())).count())
    }

    pub fn all(&self) -> impl Iterator<Item = &str> + '_ {
        self.nodes.iter().map(String::as_str)
    }

    pub fn contains(&self, authority: &str) -> bool {
        self.nodes.contains(authority)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// `http://127.0.0.1:5001/anything` -> `127.0.0.1:5001`. An explicit port is
/// kept even when it is the scheme's default.
pub fn authority_of(address: &str) -> Result<String, PeerError> {
    let invalid = |reason: &str| PeerError::InvalidAddress {
        address: address.to_string(),
        reason: reason.to_string(),
    };
    let trimmed = address.trim();
    let url = Url::parse(trimmed).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host"));
    }
    let normalized = &url[Position::BeforeHost..Position::AfterPort];
    Ok(written_authority(trimmed).unwrap_or(normalized).to_string())
}

/// `host[:port]` as it appears in `address`. `Url` drops a port that equals the
/// scheme default, which would send `https://host:443` to port 80.
fn written_authority(address: &str) -> Option<&str> {
    let (_, rest) = address.split_once("://")?;
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..end];
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, host_port)| host_port);
    (!host_port.is_empty()).then_some(host_port)
}
