//! File name resolution for transfer results.
//!
//! A download's name comes from the server's `Content-Disposition` header when
//! present, then the caller's hint, then the URL (the `path` query parameter
//! used by media endpoints, or the last path segment).

use std::path::{Component, Path};

use url::Url;

/// Name used when nothing better is known.
pub const FALLBACK_NAME: &str = "download";

/// Picks the final name for a completed transfer.
#[must_use]
pub fn resolve_final_name(server_name: Option<&str>, hint: &str, url: &Url) -> String {
    server_name
        .map(sanitize_filename)
        .filter(|name| !name.is_empty())
        .or_else(|| {
            let hint = hint.trim();
            (!hint.is_empty()).then(|| sanitize_filename(hint))
        })
        .or_else(|| name_from_url(url))
        .unwrap_or_else(|| FALLBACK_NAME.to_string())
}

/// Derives a file name from a URL.
///
/// Media endpoints address files as `.../media_stream/?path=dir/file.mp4`, so
/// the basename of a `path` query parameter wins over the URL path.
#[must_use]
pub fn name_from_url(url: &Url) -> Option<String> {
    let from_query = url
        .query_pairs()
        .find(|(key, _)| key == "path")
        .and_then(|(_, value)| {
            value
                .rsplit('/')
                .next()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        });
    if let Some(name) = from_query {
        return Some(sanitize_filename(&name));
    }

    let last = url.path_segments()?.rev().find(|s| !s.is_empty())?;
    let decoded = urlencoding::decode(last).map_or_else(|_| last.to_string(), |d| d.into_owned());
    Some(sanitize_filename(&decoded))
}

/// Parses a `Content-Disposition` header value for a file name.
///
/// Handles `filename="a.mp4"`, `filename=a.mp4` and the RFC 5987
/// `filename*=UTF-8''a%20b.mp4` form, preferring the latter.
#[must_use]
pub fn parse_content_disposition(header: &str) -> Option<String> {
    if let Some(pos) = header.find("filename*=") {
        let value = header[pos + "filename*=".len()..].trim();
        if let Some(quote_pos) = value.find("''") {
            let encoded = &value[quote_pos + 2..];
            let end = encoded.find(';').unwrap_or(encoded.len());
            if let Ok(decoded) = urlencoding::decode(encoded[..end].trim()) {
                return Some(decoded.into_owned());
            }
        }
    }

    let pos = header.find("filename=")?;
    let value = header[pos + "filename=".len()..].trim();
    if let Some(stripped) = value.strip_prefix('"') {
        let end = stripped.find('"')?;
        return Some(stripped[..end].to_string()).filter(|s| !s.is_empty());
    }
    let end = value.find(';').unwrap_or(value.len());
    let name = value[..end].trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Replaces characters that are invalid on common filesystems and neutralizes
/// `.`/`..` segments.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return String::new();
    }

    let unsafe_segment = Path::new(&sanitized).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if unsafe_segment {
        sanitized.replace('.', "_")
    } else {
        sanitized
    }
}

/// Guesses a MIME type from a file name's extension.
#[must_use]
pub fn content_type_for_name(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "flac" => "audio/flac",
        "vtt" => "text/vtt",
        "srt" => "application/x-subrip",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "json" => "application/json",
        "txt" => "text/plain",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}
