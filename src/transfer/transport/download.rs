//! Streaming `GET` transport.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use reqwest::Client;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, HeaderMap};
use tracing::{debug, instrument};
use url::Url;

use super::{TransportAdapter, TransportEvent};
use crate::transfer::error::TransferError;
use crate::transfer::filename::parse_content_disposition;
use crate::transfer::request::AuthToken;

enum State {
    Pending,
    Streaming(BoxStream<'static, reqwest::Result<Bytes>>),
    Done,
}

/// Streams a response body for one download.
///
/// The first event sends the request and reports the declared length and
/// server file name. Each following event is one body chunk, sized however
/// the connection delivers it. [`abort`](TransportAdapter::abort) drops the
/// body stream, closing the connection.
pub struct DownloadAdapter {
    client: Client,
    url: Url,
    auth: Option<AuthToken>,
    state: State,
}

impl DownloadAdapter {
    /// Creates an adapter; nothing is sent until the first event is pulled.
    #[must_use]
    pub fn new(client: Client, url: Url, auth: Option<AuthToken>) -> Self {
        Self {
            client,
            url,
            auth,
            state: State::Pending,
        }
    }

    #[instrument(level = "debug", skip(self), fields(url = %self.url))]
    async fn open(&mut self) -> Result<TransportEvent, TransferError> {
        let mut request = self.client.get(self.url.clone());
        if let Some(token) = &self.auth {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransferError::network(self.url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::http_status(
                self.url.as_str(),
                status.as_u16(),
            ));
        }

        let total_bytes = declared_length(response.headers(), &self.url)?;
        let file_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_disposition);
        debug!(status = status.as_u16(), ?total_bytes, ?file_name, "download response opened");

        self.state = State::Streaming(response.bytes_stream().boxed());
        Ok(TransportEvent::Opened {
            total_bytes,
            file_name,
        })
    }
}

/// Reads `Content-Length`; a present but unparsable value is malformed.
fn declared_length(headers: &HeaderMap, url: &Url) -> Result<Option<u64>, TransferError> {
    let Some(value) = headers.get(CONTENT_LENGTH) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Some)
        .ok_or_else(|| {
            TransferError::malformed(
                url.as_str(),
                format!("unparsable Content-Length header: {value:?}"),
            )
        })
}

#[async_trait]
impl TransportAdapter for DownloadAdapter {
    async fn next_event(&mut self) -> Result<TransportEvent, TransferError> {
        match &mut self.state {
            State::Pending => self.open().await,
            State::Streaming(stream) => loop {
                match stream.next().await {
                    Some(Ok(chunk)) if chunk.is_empty() => {}
                    Some(Ok(chunk)) => return Ok(TransportEvent::Data(chunk)),
                    Some(Err(e)) => {
                        self.state = State::Done;
                        return Err(TransferError::network(self.url.as_str(), e));
                    }
                    None => {
                        self.state = State::Done;
                        return Ok(TransportEvent::Finished {
                            response: Bytes::new(),
                        });
                    }
                }
            },
            State::Done => Ok(TransportEvent::Finished {
                response: Bytes::new(),
            }),
        }
    }

    async fn abort(&mut self) {
        if !matches!(self.state, State::Done) {
            debug!(url = %self.url, "closing download stream");
        }
        self.state = State::Done;
    }
}
