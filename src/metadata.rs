use std::time::{SystemTime, UNIX_EPOCH};

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::models::{ConversionType, OutputMetadata, ResolvedDownload, UpstreamResult};

/// Build the response body from the conversion envelope and the probed
/// headers. `now` seeds the fallback filename when the title is blank.
pub fn compose(
    kind: ConversionType,
    upstream: &UpstreamResult,
    resolved: &ResolvedDownload,
    now: u64,
) -> OutputMetadata {
    let content_type = resolved.content_type.as_deref();

    let stem = if upstream.title.is_empty() {
        format!("converted_video_{now}")
    } else {
        upstream.title.clone()
    };

    let ext = match kind {
        ConversionType::Mp3 => "mp3",
        ConversionType::Mp4 => "mp4",
        ConversionType::Merged if content_type.map_or(false, |ct| ct.contains("video/webm")) => {
            "webm"
        }
        ConversionType::Merged => "mp4",
    };

    let mime_type = match (content_type, kind) {
        (Some(ct), _) => ct.to_string(),
        (None, ConversionType::Mp3) => "audio/mpeg".to_string(),
        (None, ConversionType::Mp4 | ConversionType::Merged) => "video/mp4".to_string(),
    };

    OutputMetadata {
        filename: format!("{stem}.{ext}"),
        size: resolved.content_length.clone().unwrap_or_default(),
        mime_type,
        download_url: upstream.url.clone(),
    }
}

/// Bytes kept as-is inside a URL path segment; everything else is escaped.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b':')
    .remove(b'=')
    .remove(b'@');

/// `Content-Disposition` value naming the converted file.
pub fn content_disposition(filename: &str) -> String {
    format!(
        "attachment; filename=\"{}\"",
        utf8_percent_encode(filename, PATH_SEGMENT)
    )
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
