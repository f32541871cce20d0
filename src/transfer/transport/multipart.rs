//! `multipart/form-data` serialization with an exact up-front length.

use bytes::Bytes;
use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::transfer::filename::content_type_for_name;
use crate::transfer::request::NamedBlob;

const BOUNDARY_PREFIX: &str = "----MediaTransferBoundary";
const BOUNDARY_RANDOM_LEN: usize = 24;

/// A fully serialized multipart body.
///
/// Blob contents are kept as shared [`Bytes`] segments, so encoding copies
/// only the part headers, never the file data.
#[derive(Debug, Clone)]
pub struct MultipartBody {
    boundary: String,
    segments: Vec<Bytes>,
    len: u64,
}

impl MultipartBody {
    /// Serializes `blobs` as repeated `field` parts with a random boundary.
    #[must_use]
    pub fn encode(field: &str, blobs: &[NamedBlob]) -> Self {
        let random: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(BOUNDARY_RANDOM_LEN)
            .map(char::from)
            .collect();
        Self::encode_with_boundary(field, blobs, format!("{BOUNDARY_PREFIX}{random}"))
    }

    /// Serializes with a caller-chosen boundary.
    #[must_use]
    pub fn encode_with_boundary(field: &str, blobs: &[NamedBlob], boundary: String) -> Self {
        let mut segments = Vec::with_capacity(blobs.len() * 3 + 1);
        for blob in blobs {
            let content_type = blob
                .content_type()
                .unwrap_or_else(|| content_type_for_name(blob.name()));
            let header = format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {content_type}\r\n\r\n",
                escape_quoted(field),
                escape_quoted(blob.name()),
            );
            segments.push(Bytes::from(header));
            segments.push(blob.data().clone());
            segments.push(Bytes::from_static(b"\r\n"));
        }
        segments.push(Bytes::from(format!("--{boundary}--\r\n")));

        let len = segments.iter().map(|s| s.len() as u64).sum();
        Self {
            boundary,
            segments,
            len,
        }
    }

    /// Boundary string separating parts.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// `Content-Type` header value for this body.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Exact serialized size in bytes.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns true if the body has no bytes (never the case once encoded).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Splits the body into slices of at most `chunk_size` bytes, in order.
    ///
    /// Slicing is zero-copy.
    #[must_use]
    pub fn into_slices(self, chunk_size: usize) -> Vec<Bytes> {
        let chunk_size = chunk_size.max(1);
        let mut slices = Vec::new();
        for segment in self.segments {
            let mut offset = 0;
            while offset < segment.len() {
                let end = (offset + chunk_size).min(segment.len());
                slices.push(segment.slice(offset..end));
                offset = end;
            }
        }
        slices
    }
}

/// Browsers percent-encode `"` and strip line breaks in multipart names.
fn escape_quoted(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '\r' | '\n'))
        .map(|c| if c == '"' { "%22".to_string() } else { c.to_string() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> Vec<NamedBlob> {
        vec![
            NamedBlob::new("a.mp4", b"AAAA".to_vec()),
            NamedBlob::new("notes.txt", b"hi".to_vec()).with_content_type("text/plain"),
        ]
    }

    #[test]
    fn test_encode_layout() {
        let body = MultipartBody::encode_with_boundary("files", &blobs(), "XyZ".to_string());
        let bytes: Vec<u8> = body.clone().into_slices(1024).concat();
        let text = String::from_utf8(bytes).unwrap_or_default();
        let expected = "--XyZ\r\n\
            Content-Disposition: form-data; name=\"files\"; filename=\"a.mp4\"\r\n\
            Content-Type: video/mp4\r\n\r\n\
            AAAA\r\n\
            --XyZ\r\n\
            Content-Disposition: form-data; name=\"files\"; filename=\"notes.txt\"\r\n\
            Content-Type: text/plain\r\n\r\n\
            hi\r\n\
            --XyZ--\r\n";
        assert_eq!(text, expected);
        assert_eq!(body.len(), expected.len() as u64);
        assert_eq!(body.content_type(), "multipart/form-data; boundary=XyZ");
    }

    #[test]
    fn test_slices_respect_chunk_size_and_total() {
        let data = vec![9u8; 10_000];
        let body = MultipartBody::encode("files", &[NamedBlob::new("big.bin", data)]);
        let total = body.len();
        let slices = body.into_slices(4096);
        assert!(slices.iter().all(|s| !s.is_empty() && s.len() <= 4096));
        assert_eq!(slices.iter().map(|s| s.len() as u64).sum::<u64>(), total);
    }

    #[test]
    fn test_random_boundaries_differ() {
        let a = MultipartBody::encode("files", &blobs());
        let b = MultipartBody::encode("files", &blobs());
        assert!(a.boundary().starts_with(BOUNDARY_PREFIX));
        assert_ne!(a.boundary(), b.boundary());
    }

    #[test]
    fn test_quotes_in_names_are_escaped() {
        let body = MultipartBody::encode_with_boundary(
            "files",
            &[NamedBlob::new("say \"hi\"\r\n.txt", b"x".to_vec())],
            "B".to_string(),
        );
        let text = String::from_utf8(body.into_slices(4096).concat()).unwrap_or_default();
        assert!(text.contains("filename=\"say %22hi%22.txt\""), "got: {text}");
    }
}
