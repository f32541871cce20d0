//! Transfer request descriptors and validation.

use std::fmt;

use bytes::Bytes;
use url::Url;

use super::error::TransferError;

/// Which way the payload moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Client to server.
    Upload,
    /// Server to client.
    Download,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upload => f.write_str("upload"),
            Self::Download => f.write_str("download"),
        }
    }
}

/// Opaque bearer credential supplied by the caller.
///
/// The engine only attaches it to outgoing requests. `Debug` is redacted so
/// the value never reaches logs.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wraps a credential string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw credential for attaching to a request.
    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

/// One named byte blob in an upload payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedBlob {
    name: String,
    data: Bytes,
    content_type: Option<String>,
}

impl NamedBlob {
    /// Creates a blob with the given file name and contents.
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
            content_type: None,
        }
    }

    /// Sets the MIME type sent with this part.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// File name sent with this part.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Blob contents.
    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Explicit MIME type, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Size of the blob contents in bytes.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    /// Returns true if the blob has no contents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Immutable description of one transfer.
///
/// Built with [`TransferRequest::download`] or [`TransferRequest::upload`] and
/// the `with_*` setters; read-only once handed to the engine.
///
/// # Example
///
/// ```
/// use media_transfer::transfer::{AuthToken, TransferRequest};
///
/// let request = TransferRequest::download("https://media.example/api/media_stream/?path=a.mp4")
///     .with_destination_hint("a.mp4")
///     .with_auth_token(AuthToken::new("token"));
/// assert!(request.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct TransferRequest {
    direction: Direction,
    resource_identifier: String,
    payload_source: Vec<NamedBlob>,
    destination_hint: String,
    destination_path: Option<String>,
    auth_token: Option<AuthToken>,
}

impl TransferRequest {
    /// Creates a request from raw parts without checking consistency.
    ///
    /// Prefer [`download`](Self::download) or [`upload`](Self::upload);
    /// inconsistencies are reported by [`validate`](Self::validate).
    pub fn new(
        direction: Direction,
        resource_identifier: impl Into<String>,
        payload_source: Vec<NamedBlob>,
        destination_hint: impl Into<String>,
    ) -> Self {
        Self {
            direction,
            resource_identifier: resource_identifier.into(),
            payload_source,
            destination_hint: destination_hint.into(),
            destination_path: None,
            auth_token: None,
        }
    }

    /// Creates a download request for the given URL.
    pub fn download(resource_identifier: impl Into<String>) -> Self {
        Self::new(Direction::Download, resource_identifier, Vec::new(), "")
    }

    /// Creates an upload request posting `blobs` to the given URL.
    pub fn upload(resource_identifier: impl Into<String>, blobs: Vec<NamedBlob>) -> Self {
        Self::new(Direction::Upload, resource_identifier, blobs, "")
    }

    /// Sets the suggested file name for the result.
    #[must_use]
    pub fn with_destination_hint(mut self, hint: impl Into<String>) -> Self {
        self.destination_hint = hint.into();
        self
    }

    /// Sets the server-side destination directory for an upload.
    #[must_use]
    pub fn with_destination_path(mut self, path: impl Into<String>) -> Self {
        self.destination_path = Some(path.into());
        self
    }

    /// Attaches the bearer credential.
    #[must_use]
    pub fn with_auth_token(mut self, token: AuthToken) -> Self {
        self.auth_token = Some(token);
        self
    }

    /// Transfer direction.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Target URL as supplied.
    #[must_use]
    pub fn resource_identifier(&self) -> &str {
        &self.resource_identifier
    }

    /// Upload blobs in send order (empty for downloads).
    #[must_use]
    pub fn payload_source(&self) -> &[NamedBlob] {
        &self.payload_source
    }

    /// Suggested file name for the result.
    #[must_use]
    pub fn destination_hint(&self) -> &str {
        &self.destination_hint
    }

    /// Upload destination directory, if set.
    #[must_use]
    pub fn destination_path(&self) -> Option<&str> {
        self.destination_path.as_deref()
    }

    /// Bearer credential, if any.
    #[must_use]
    pub fn auth_token(&self) -> Option<&AuthToken> {
        self.auth_token.as_ref()
    }

    /// Checks that the fields are consistent with the direction.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::InvalidRequest`] if the URL is empty or not an
    /// absolute http(s) URL, an upload has no blobs or an unnamed blob, or a
    /// download carries upload-only fields.
    pub fn validate(&self) -> Result<(), TransferError> {
        self.parsed_url().map(|_| ())?;

        match self.direction {
            Direction::Upload => {
                if self.payload_source.is_empty() {
                    return Err(TransferError::invalid_request(
                        "upload request has no payload blobs",
                    ));
                }
                if let Some(index) = self
                    .payload_source
                    .iter()
                    .position(|blob| blob.name.trim().is_empty())
                {
                    return Err(TransferError::invalid_request(format!(
                        "upload blob #{index} has an empty name"
                    )));
                }
            }
            Direction::Download => {
                if !self.payload_source.is_empty() {
                    return Err(TransferError::invalid_request(
                        "download request must not carry payload blobs",
                    ));
                }
                if self.destination_path.is_some() {
                    return Err(TransferError::invalid_request(
                        "destination path only applies to uploads",
                    ));
                }
            }
        }

        Ok(())
    }

    /// Builds the URL the transport should hit, including the upload `path`
    /// query parameter when a non-blank destination path is set.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::InvalidRequest`] if the resource identifier is
    /// not an absolute http(s) URL.
    pub fn target_url(&self) -> Result<Url, TransferError> {
        let mut url = self.parsed_url()?;
        if self.direction == Direction::Upload
            && let Some(path) = self.destination_path.as_deref().map(str::trim)
            && !path.is_empty()
        {
            url.query_pairs_mut().append_pair("path", path);
        }
        Ok(url)
    }

    fn parsed_url(&self) -> Result<Url, TransferError> {
        let raw = self.resource_identifier.trim();
        if raw.is_empty() {
            return Err(TransferError::invalid_request("resource identifier is empty"));
        }
        let url = Url::parse(raw).map_err(|e| {
            TransferError::invalid_request(format!("resource identifier '{raw}' is not a URL: {e}"))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TransferError::invalid_request(format!(
                "unsupported scheme '{}' in resource identifier",
                url.scheme()
            )));
        }
        Ok(url)
    }
}
