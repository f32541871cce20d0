//! Multipart `POST` transport with send-side progress.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::future::BoxFuture;
use futures_util::{FutureExt, stream};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client, Response};
use tokio::sync::mpsc;
use tracing::{debug, instrument};
use url::Url;

use super::multipart::MultipartBody;
use super::{TransportAdapter, TransportEvent};
use crate::transfer::error::TransferError;
use crate::transfer::request::AuthToken;

enum State {
    Pending {
        body: MultipartBody,
    },
    Sending {
        response: BoxFuture<'static, reqwest::Result<Response>>,
        sent: mpsc::UnboundedReceiver<u64>,
    },
    Done,
}

enum Step {
    Credit(u64),
    Responded(reqwest::Result<Response>),
}

/// Uploads one multipart body and reports bytes sent.
///
/// The first event declares the serialized size. While the request is in
/// flight each slice handed to the connection yields a
/// [`TransportEvent::Sent`]. The exchange only finishes once a 2xx response
/// arrives; a non-2xx response after a complete send is an error.
pub struct UploadAdapter {
    client: Client,
    url: Url,
    auth: Option<AuthToken>,
    chunk_size: usize,
    state: State,
}

impl UploadAdapter {
    /// Creates an adapter; nothing is sent until the first event is pulled.
    #[must_use]
    pub fn new(
        client: Client,
        url: Url,
        auth: Option<AuthToken>,
        body: MultipartBody,
        chunk_size: usize,
    ) -> Self {
        Self {
            client,
            url,
            auth,
            chunk_size,
            state: State::Pending { body },
        }
    }

    fn start(&mut self, body: MultipartBody) -> TransportEvent {
        let total = body.len();
        let content_type = body.content_type();
        let (tx, rx) = mpsc::unbounded_channel();

        let mut cumulative: u64 = 0;
        let slices = stream::iter(body.into_slices(self.chunk_size).into_iter().map(
            move |slice| {
                cumulative += slice.len() as u64;
                // The receiver is gone only after an abort; the request is
                // being dropped then anyway.
                let _ = tx.send(cumulative);
                Ok::<Bytes, std::io::Error>(slice)
            },
        ));

        let mut request = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, total)
            .body(Body::wrap_stream(slices));
        if let Some(token) = &self.auth {
            request = request.bearer_auth(token.expose_secret());
        }

        debug!(url = %self.url, total, "upload request started");
        self.state = State::Sending {
            response: request.send().boxed(),
            sent: rx,
        };
        TransportEvent::Opened {
            total_bytes: Some(total),
            file_name: None,
        }
    }

    /// Takes the URL by value so the returned future does not borrow the
    /// adapter, which is not `Sync` while a send is in flight.
    #[instrument(level = "debug", skip(response), fields(url = %url))]
    async fn finish(url: Url, response: Response) -> Result<TransportEvent, TransferError> {
        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::http_status(url.as_str(), status.as_u16()));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| TransferError::network(url.as_str(), e))?;
        debug!(status = status.as_u16(), bytes = body.len(), "upload acknowledged");
        Ok(TransportEvent::Finished { response: body })
    }
}

#[async_trait]
impl TransportAdapter for UploadAdapter {
    async fn next_event(&mut self) -> Result<TransportEvent, TransferError> {
        // Dropping this future mid-send leaves the state at Done, which drops
        // the request just as `abort` would.
        let completed = match std::mem::replace(&mut self.state, State::Done) {
            State::Pending { body } => return Ok(self.start(body)),
            State::Sending {
                mut response,
                mut sent,
            } => {
                // Drain send credit before looking at the response so every
                // Sent event precedes Finished.
                let step = tokio::select! {
                    biased;
                    Some(cumulative) = sent.recv() => Step::Credit(cumulative),
                    result = &mut response => Step::Responded(result),
                };
                match step {
                    Step::Credit(cumulative) => {
                        self.state = State::Sending { response, sent };
                        return Ok(TransportEvent::Sent { cumulative });
                    }
                    Step::Responded(result) => result,
                }
            }
            State::Done => {
                return Ok(TransportEvent::Finished {
                    response: Bytes::new(),
                });
            }
        };

        let response = completed.map_err(|e| TransferError::network(self.url.as_str(), e))?;
        Self::finish(self.url.clone(), response).await
    }

    async fn abort(&mut self) {
        if matches!(self.state, State::Sending { .. }) {
            debug!(url = %self.url, "dropping in-flight upload request");
        }
        self.state = State::Done;
    }
}
