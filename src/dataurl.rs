//! `data:` URL codec for encoded images.
//!
//! The relay message and the delivery record both carry the payload as a
//! data URL, so this is the one place that knows the format.

use base64::Engine;
use regex::Regex;
use std::sync::OnceLock;

const DEFAULT_MIME: &str = "image/png";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DataUrlError {
    #[error("missing `data:` prefix")]
    MissingScheme,
    #[error("missing `,` between header and body")]
    MissingSeparator,
    #[error("only base64 data URLs are supported")]
    NotBase64,
    #[error("invalid base64 body: {0}")]
    Base64(String),
}

/// A parsed data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Render `bytes` as `data:<mime>;base64,<body>`.
pub fn encode(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

fn mime_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^data:([^;,]+)").expect("static regex"))
}

impl DataUrl {
    pub fn parse(input: &str) -> Result<Self, DataUrlError> {
        let input = input.trim();
        if !input.starts_with("data:") {
            return Err(DataUrlError::MissingScheme);
        }
        let (header, body) = input
            .split_once(',')
            .ok_or(DataUrlError::MissingSeparator)?;
        if !header.ends_with(";base64") {
            return Err(DataUrlError::NotBase64);
        }

        let mime = mime_pattern()
            .captures(header)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| DEFAULT_MIME.to_string());

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(body)
            .map_err(|e| DataUrlError::Base64(e.to_string()))?;

        Ok(Self { mime, bytes })
    }

    /// File extension for upload filenames.
    pub fn extension(&self) -> &str {
        match self.mime.as_str() {
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            _ => "png",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reads_mime_and_body() {
        let url = encode("image/png", &[1, 2, 3, 250]);
        assert!(url.starts_with("data:image/png;base64,"));
        let parsed = DataUrl::parse(&url).unwrap();
        assert_eq!(parsed.mime, "image/png");
        assert_eq!(parsed.bytes, vec![1, 2, 3, 250]);
    }

    #[test]
    fn missing_mime_defaults_to_png() {
        let parsed = DataUrl::parse("data:;base64,AAEC").unwrap();
        assert_eq!(parsed.mime, "image/png");
        assert_eq!(parsed.bytes, vec![0, 1, 2]);
    }

    #[test]
    fn malformed_inputs_are_rejected() {
        assert_eq!(DataUrl::parse("hello"), Err(DataUrlError::MissingScheme));
        assert_eq!(DataUrl::parse("data:image/png;base64"), Err(DataUrlError::MissingSeparator));
        assert_eq!(DataUrl::parse("data:text/plain,hi"), Err(DataUrlError::NotBase64));
        assert!(matches!(
            DataUrl::parse("data:image/png;base64,@@@"),
            Err(DataUrlError::Base64(_))
        ));
    }
}
