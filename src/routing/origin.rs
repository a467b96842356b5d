//! Backend origins (scheme + host + port).

use std::fmt;
use std::net::IpAddr;

use axum::http::uri::{PathAndQuery, Uri};
use url::{Host, Url};

/// A validated `http`/`https` origin with no path, query or fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    scheme: String,
    host: String,
    authority: String,
    port: u16,
    local: bool,
}

impl Origin {
    /// Parse an origin string such as `http://localhost:8000`.
    ///
    /// A trailing `/` is accepted; any other path component is rejected.
    pub fn parse(input: &str) -> Result<Self, String> {
        let url = Url::parse(input).map_err(|e| e.to_string())?;

        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(format!("unsupported scheme {scheme:?}"));
        }
        if url.path() != "/" {
            return Err(format!("origin must not carry a path, found {:?}", url.path()));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err("origin must not carry a query or fragment".to_string());
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err("origin must not carry credentials".to_string());
        }

        let host = url.host().ok_or_else(|| "origin has no host".to_string())?;
        let local = match &host {
            Host::Domain(name) => name.eq_ignore_ascii_case("localhost"),
            Host::Ipv4(ip) => is_local_ip(IpAddr::V4(*ip)),
            Host::Ipv6(ip) => is_local_ip(IpAddr::V6(*ip)),
        };
        let host = url
            .host_str()
            .ok_or_else(|| "origin has no host".to_string())?
            .to_string();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| "origin has no port".to_string())?;
        let authority = match url.port() {
            Some(explicit) => format!("{host}:{explicit}"),
            None => host.clone(),
        };

        Ok(Self {
            scheme: scheme.to_string(),
            host,
            authority,
            port,
            local,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// `host[:port]` as written in the origin; used as the rewritten Host header.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Effective port, falling back to the scheme default.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether the host is loopback, unspecified or `localhost`.
    pub fn is_local(&self) -> bool {
        self.local
    }

    /// Absolute URI on this origin for the given path and query.
    pub fn uri_for(&self, path_and_query: Option<&PathAndQuery>) -> Result<Uri, axum::http::Error> {
        let path_and_query = path_and_query.map(PathAndQuery::as_str).unwrap_or("/");
        Uri::builder()
            .scheme(self.scheme.as_str())
            .authority(self.authority.as_str())
            .path_and_query(path_and_query)
            .build()
    }
}

fn is_local_ip(ip: IpAddr) -> bool {
    ip.is_loopback() || ip.is_unspecified()
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority)
    }
}
