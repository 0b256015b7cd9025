//! Builder pattern for client configuration.
//!
//! # Example
//!
//! ```no_run
//! use graphql_ws_client::{Client, Payload};
//!
//! # async fn example() -> graphql_ws_client::Result<()> {
//! let client = Client::builder()
//!     .url("ws://localhost:4000/graphql")
//!     .header("Authorization", "Bearer token")
//!     .connection_init(Payload::new())
//!     .connect()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::{IdGenerator, RandomIds};
use crate::protocol::{Payload, SUBPROTOCOL};
use crate::transport::connection;

use super::core::Client;

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for configuring a [`Client`].
///
/// Use [`Client::builder()`] to create a new builder.
#[derive(Default)]
pub struct ClientBuilder {
    /// WebSocket endpoint.
    url: Option<String>,
    /// Extra handshake headers.
    headers: Vec<(String, String)>,
    /// Payload for an automatic `connection_init`.
    init_payload: Option<Payload>,
    /// Subscription id source.
    ids: Option<Box<dyn IdGenerator>>,
}

impl ClientBuilder {
    /// Creates a builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `ws://` or `wss://` endpoint.
    #[inline]
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Adds a header to the WebSocket handshake request.
    #[inline]
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Queues `connection_init` with `payload` as the first frame.
    #[inline]
    #[must_use]
    pub fn connection_init(mut self, payload: Payload) -> Self {
        self.init_payload = Some(payload);
        self
    }

    /// Replaces the default random subscription id source.
    #[inline]
    #[must_use]
    pub fn id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Some(Box::new(ids));
        self
    }

    /// Validates the configuration and starts connecting.
    ///
    /// Returns immediately with a client in the `Connecting` state; frames
    /// sent before the handshake completes are queued. Must be called from
    /// within a tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the URL is missing, not `ws`/`wss`, or a header
    ///   is invalid
    /// - [`Error::Url`] if the URL does not parse
    pub fn connect(self) -> Result<Client> {
        let url = self.validate_url()?;
        let request = self.build_request(&url)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let ids = self.ids.unwrap_or_else(|| Box::new(RandomIds));
        let client = Client::from_channel(tx, ids);

        if let Some(payload) = self.init_payload {
            client.connection_init(Some(payload))?;
        }

        debug!(%url, "Connecting");
        tokio::spawn(connection::run(client.clone(), request, rx));

        Ok(client)
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ClientBuilder {
    /// Validates the endpoint URL.
    fn validate_url(&self) -> Result<Url> {
        let raw = self.url.as_deref().ok_or_else(|| {
            Error::config(
                "Endpoint URL is required. Use .url() to set it.\n\
                 Example: Client::builder().url(\"ws://localhost:4000/graphql\")",
            )
        })?;

        let url = Url::parse(raw)?;
        match url.scheme() {
            "ws" | "wss" => Ok(url),
            scheme => Err(Error::config(format!(
                "Unsupported URL scheme '{scheme}', expected 'ws' or 'wss'"
            ))),
        }
    }

    /// Builds the handshake request with sub-protocol and custom headers.
    fn build_request(&self, url: &Url) -> Result<Request> {
        let mut request = url.as_str().into_client_request()?;
        let headers = request.headers_mut();

        headers.insert(
            SEC_WEBSOCKET_PROTOCOL,
            HeaderValue::from_static(SUBPROTOCOL),
        );

        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::config(format!("Invalid header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::config(format!("Invalid value for header '{name}': {e}")))?;
            headers.append(name, value);
        }

        Ok(request)
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("init_payload", &self.init_payload)
            .field("custom_ids", &self.ids.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_url() {
        let err = ClientBuilder::new().validate_url().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_rejects_http_scheme() {
        let err = ClientBuilder::new()
            .url("http://localhost:4000/graphql")
            .validate_url()
            .unwrap_err();
        assert!(err.to_string().contains("Unsupported URL scheme 'http'"));
    }

    #[test]
    fn test_unparsable_url() {
        let err = ClientBuilder::new().url("::nope").validate_url().unwrap_err();
        assert!(matches!(err, Error::Url(_)));
    }

    #[test]
    fn test_request_carries_subprotocol_and_headers() {
        let builder = ClientBuilder::new()
            .url("wss://api.example.com/graphql")
            .header("Authorization", "Bearer abc");
        let url = builder.validate_url().expect("valid url");
        let request = builder.build_request(&url).expect("request");

        assert_eq!(
            request.headers().get(SEC_WEBSOCKET_PROTOCOL),
            Some(&HeaderValue::from_static(SUBPROTOCOL))
        );
        assert_eq!(
            request.headers().get("authorization"),
            Some(&HeaderValue::from_static("Bearer abc"))
        );
    }

    #[test]
    fn test_invalid_header_name() {
        let builder = ClientBuilder::new()
            .url("ws://localhost/graphql")
            .header("bad header", "x");
        let url = builder.validate_url().expect("valid url");
        let err = builder.build_request(&url).unwrap_err();
        assert!(err.is_config_error());
    }

    #[tokio::test]
    async fn test_connect_returns_connecting_client() {
        let client = ClientBuilder::new()
            .url("ws://127.0.0.1:9/graphql")
            .connection_init(Payload::new())
            .connect()
            .expect("connect");

        // The handshake runs in the background; nothing is open yet.
        assert_ne!(client.ready_state(), crate::ReadyState::Open);
    }
}
