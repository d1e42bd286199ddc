use crate::dns::{Question, Resolutions};
use crate::error::ResolveError;
use async_trait::async_trait;
use futures::future::join_all;
use log::{debug, warn};
use std::net::Ipv4Addr;
use url::form_urlencoded::byte_serialize;

/// Placeholder in the endpoint template replaced by the queried name.
pub const DOMAIN_TOKEN: &str = "{domain}";

/// Looks up the IPv4 addresses of a single name.
///
/// An empty list means the name has no record. Errors are scoped to the
/// name being resolved.
#[async_trait]
pub trait Resolve: Send + Sync {
    async fn resolve(&self, name: &str) -> Result<Vec<Ipv4Addr>, ResolveError>;
}

/// Resolves names by calling an HTTP endpoint that answers with a
/// delimiter-separated list of dotted quads.
#[derive(Debug, Clone)]
pub struct HttpResolver {
    client: reqwest::Client,
    endpoint: String,
    delimiter: String,
}

impl HttpResolver {
    pub fn new(endpoint: impl Into<String>, delimiter: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint, delimiter)
    }

    pub fn with_client(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        delimiter: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            delimiter: delimiter.into(),
        }
    }

    /// Lookup URL for `name`, percent-encoded so that characters such as
    /// `#`, `?`, `&` or `/` inside a label stay part of the name.
    pub fn url_for(&self, name: &str) -> String {
        let encoded: String = byte_serialize(name.as_bytes()).collect();

        self.endpoint.replace(DOMAIN_TOKEN, &encoded)
    }
}

#[async_trait]
impl Resolve for HttpResolver {
    async fn resolve(&self, name: &str) -> Result<Vec<Ipv4Addr>, ResolveError> {
        let url = self.url_for(name);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        debug!("lookup {} -> {:?}", url, body);

        parse_addresses(&body, &self.delimiter)
    }
}

/// Splits a lookup body into addresses. A blank body yields no addresses.
pub fn parse_addresses(body: &str, delimiter: &str) -> Result<Vec<Ipv4Addr>, ResolveError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    body.split(delimiter)
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(|piece| {
            piece
                .parse::<Ipv4Addr>()
                .map_err(|_| ResolveError::InvalidAddress(piece.to_string()))
        })
        .collect()
}

/// Resolves every distinct question name of one request concurrently.
///
/// A failed lookup is logged and leaves its name with no addresses; the
/// other names are unaffected.
pub async fn resolve_all<R>(resolver: &R, questions: &[Question]) -> Resolutions
where
    R: Resolve + ?Sized,
{
    let mut names: Vec<&str> = Vec::with_capacity(questions.len());
    for question in questions {
        if !names.contains(&question.qname.as_str()) {
            names.push(&question.qname);
        }
    }

    let lookups = names.iter().map(|name| async move {
        let addresses = match resolver.resolve(name).await {
            Ok(addresses) => addresses,
            Err(e) => {
                warn!("failed to resolve {}: {}", name, e);
                Vec::new()
            }
        };

        (name.to_string(), addresses)
    });

    join_all(lookups).await.into_iter().collect()
}
