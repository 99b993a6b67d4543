//! `data:` URL decoding.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;

use crate::{BlobError, BlobResult};

/// Image types served back to browsers. Formats that can carry script,
/// such as `image/svg+xml`, are not on the list.
pub const RASTER_IMAGE_TYPES: [&str; 4] = ["image/png", "image/jpeg", "image/gif", "image/webp"];

pub fn is_raster_image(mime: &str) -> bool {
    RASTER_IMAGE_TYPES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(mime.trim()))
}

/// A decoded `data:<mime>[;params][;base64],<payload>` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime: String,
    pub data: Bytes,
}

impl DataUrl {
    pub fn parse(input: &str) -> BlobResult<Self> {
        let rest = strip_prefix_ignore_case(input.trim(), "data:")
            .ok_or_else(|| BlobError::invalid("Not a data URL"))?;
        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| BlobError::invalid("Data URL has no payload separator"))?;

        let mut params = meta.split(';');
        let mime = params.next().unwrap_or_default().trim().to_ascii_lowercase();
        let is_base64 = params.any(|p| p.trim().eq_ignore_ascii_case("base64"));

        let data = if is_base64 {
            // Tolerate line breaks some encoders insert.
            let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            STANDARD
                .decode(compact.as_bytes())
                .map_err(|e| BlobError::invalid(format!("Malformed base64 payload: {e}")))?
        } else {
            payload.as_bytes().to_vec()
        };

        Ok(Self {
            mime: if mime.is_empty() {
                "text/plain".to_string()
            } else {
                mime
            },
            data: Bytes::from(data),
        })
    }

    /// Lowercased media type of `input`, read without decoding the payload.
    pub fn media_type(input: &str) -> Option<String> {
        let rest = strip_prefix_ignore_case(input.trim(), "data:")?;
        let (meta, _) = rest.split_once(',')?;
        let mime = meta.split(';').next().unwrap_or_default().trim();
        Some(mime.to_ascii_lowercase())
    }

    pub fn is_raster_image(&self) -> bool {
        is_raster_image(&self.mime)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

fn strip_prefix_ignore_case<'a>(input: &'a str, prefix: &str) -> Option<&'a str> {
    let head = input.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &input[prefix.len()..])
}
