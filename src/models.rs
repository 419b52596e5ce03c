use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConvertError;

/// Raw query string of `GET /convert`. Both fields are optional here so the
/// handler can answer with its own 400 message.
#[derive(Debug, Default)]
pub struct ConvertQuery {
    pub url: Option<String>,
    pub kind: Option<String>,
}

impl ConvertQuery {
    /// Build from decoded query pairs. A repeated key keeps its first value.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "url" => &mut query.url,
                "type" => &mut query.kind,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConversionType {
    Mp3,
    Mp4,
    Merged,
}

impl ConversionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ConversionType::Mp3 => "mp3",
            ConversionType::Mp4 => "mp4",
            ConversionType::Merged => "merged",
        }
    }
}

impl fmt::Display for ConversionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversionType {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mp3" => Ok(ConversionType::Mp3),
            "mp4" => Ok(ConversionType::Mp4),
            "merged" => Ok(ConversionType::Merged),
            other => Err(ConvertError::InvalidType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub source_url: String,
    pub kind: ConversionType,
}

impl TryFrom<ConvertQuery> for ConversionRequest {
    type Error = ConvertError;

    fn try_from(query: ConvertQuery) -> Result<Self, Self::Error> {
        let source_url = query.url.filter(|u| !u.is_empty());
        let kind = query.kind.filter(|k| !k.is_empty());
        let (Some(source_url), Some(kind)) = (source_url, kind) else {
            return Err(ConvertError::MissingParameter);
        };
        Ok(Self {
            source_url,
            kind: kind.parse()?,
        })
    }
}

/// Envelope returned by the conversion service. Absent and `null` fields
/// decode as empty strings.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct UpstreamResult {
    #[serde(deserialize_with = "null_as_empty")]
    pub status: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub url: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub ftype: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub fsize: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub error: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl UpstreamResult {
    pub fn is_ok(&self) -> bool {
        self.status == "ok" && !self.url.is_empty()
    }

    pub fn error_message(&self) -> String {
        if self.error.is_empty() {
            "Unknown error from conversion service".to_string()
        } else {
            self.error.clone()
        }
    }
}

/// Headers read from the converted file's location.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResolvedDownload {
    pub content_type: Option<String>,
    pub content_length: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct OutputMetadata {
    pub filename: String,
    pub size: String,
    pub mime_type: String,
    pub download_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(url: Option<&str>, kind: Option<&str>) -> ConvertQuery {
        ConvertQuery {
            url: url.map(str::to_string),
            kind: kind.map(str::to_string),
        }
    }

    #[test]
    fn accepts_every_known_type() {
        for (raw, kind) in [
            ("mp3", ConversionType::Mp3),
            ("mp4", ConversionType::Mp4),
            ("merged", ConversionType::Merged),
        ] {
            let req = ConversionRequest::try_from(query(Some("https://v/1"), Some(raw))).unwrap();
            assert_eq!(req.kind, kind);
            assert_eq!(req.source_url, "https://v/1");
            assert_eq!(kind.to_string(), raw);
        }
    }

    #[test]
    fn missing_or_empty_parameters_are_rejected() {
        for q in [
            query(None, Some("mp3")),
            query(Some("https://v/1"), None),
            query(None, None),
            query(Some(""), Some("mp3")),
            query(Some("https://v/1"), Some("")),
        ] {
            assert!(matches!(
                ConversionRequest::try_from(q),
                Err(ConvertError::MissingParameter)
            ));
        }
    }

    #[test]
    fn unknown_type_is_rejected() {
        for raw in ["wav", "MP3", "mp4 ", "webm"] {
            match ConversionRequest::try_from(query(Some("https://v/1"), Some(raw))) {
                Err(ConvertError::InvalidType(t)) => assert_eq!(t, raw),
                other => panic!("expected InvalidType for {raw:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn upstream_result_tolerates_missing_fields() {
        let res: UpstreamResult = serde_json::from_str(r#"{"status":"ok"}"#).unwrap();
        assert_eq!(res.status, "ok");
        assert!(res.url.is_empty());
        assert!(!res.is_ok());
    }

    #[test]
    fn upstream_result_reads_null_as_empty() {
        let res: UpstreamResult = serde_json::from_str(
            r#"{"status":"ok","url":"https://x/f.mp3","title":"Song","ftype":"mp3","fsize":"1 MB","error":null}"#,
        )
        .unwrap();
        assert!(res.is_ok());
        assert_eq!(res.title, "Song");
        assert_eq!(res.error, "");

        let res: UpstreamResult =
            serde_json::from_str(r#"{"status":"error","url":null,"title":null,"error":null}"#)
                .unwrap();
        assert!(!res.is_ok());
        assert_eq!(res.error_message(), "Unknown error from conversion service");
    }

    #[test]
    fn first_value_of_repeated_key_wins() {
        fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
            raw.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        }

        let q = ConvertQuery::from_pairs(pairs(&[
            ("url", "https://v/1"),
            ("type", "mp3"),
            ("type", "mp4"),
            ("url", "https://v/2"),
            ("extra", "x"),
        ]));
        assert_eq!(q.url.as_deref(), Some("https://v/1"));
        assert_eq!(q.kind.as_deref(), Some("mp3"));

        // An empty first value still counts as missing.
        let q = ConvertQuery::from_pairs(pairs(&[("url", ""), ("url", "https://v/1"), ("type", "mp3")]));
        assert!(matches!(
            ConversionRequest::try_from(q),
            Err(ConvertError::MissingParameter)
        ));
    }

    #[test]
    fn upstream_error_message_falls_back_when_blank() {
        let res = UpstreamResult {
            status: "error".into(),
            ..Default::default()
        };
        assert_eq!(res.error_message(), "Unknown error from conversion service");

        let res = UpstreamResult {
            status: "error".into(),
            error: "not found".into(),
            ..Default::default()
        };
        assert_eq!(res.error_message(), "not found");
    }
}
