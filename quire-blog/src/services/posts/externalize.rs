//! Moves inline `data:image/...` payloads out of post markup into object
//! storage and points the `img` elements at the stored copies.

use std::collections::HashMap;
use std::convert::Infallible;

use anyhow::Result;
use chrono::Utc;
use futures::future::join_all;
use quire_blob::{is_raster_image, BlobAdapter, BlobCtx, DataUrl};
use quire_core::errors::QuireError;

use crate::errors::blob_error;
use crate::markup::Fragment;
use crate::paths::inline_image_path;

pub const IMAGE_UPLOAD_FAILED: &str = "Failed to upload images. Please try again.";
pub const UNSUPPORTED_IMAGE: &str = "Only PNG, JPEG, GIF and WebP images can be uploaded.";

/// Rewritten markup plus the keys of the blobs stored for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Externalized {
    pub content: String,
    pub uploaded: Vec<String>,
}

fn is_inline_image(src: &str) -> bool {
    src.trim_start()
        .get(..11)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:image/"))
}

/// Whether `data_url` holds an image type we store and serve.
pub fn is_supported_image(data_url: &str) -> bool {
    DataUrl::media_type(data_url).is_some_and(|mime| is_raster_image(&mime))
}

/// Upload every distinct inline image in `markup` once and rewrite the
/// sources to the durable URLs.
///
/// All or nothing: when an upload fails the blobs stored so far are
/// removed and the error is returned; the caller still holds its original
/// markup. Markup without inline images is returned as is.
pub async fn externalize_images(blobs: &BlobAdapter, ctx: &BlobCtx, markup: &str) -> Result<Externalized> {
    let mut fragment = Fragment::parse(markup).map_err(|e| {
        QuireError::bad_request("Post content could not be read.")
            .with_source(e.into())
            .into_anyhow()
    })?;

    let mut inline: Vec<String> = Vec::new();
    fragment.for_each_element("img", |img| {
        if let Some(src) = img.attr("src") {
            if is_inline_image(&src) && !inline.contains(&src) {
                inline.push(src);
            }
        }
    });

    if inline.is_empty() {
        return Ok(Externalized {
            content: markup.to_string(),
            uploaded: Vec::new(),
        });
    }
    if !inline.iter().all(|src| is_supported_image(src)) {
        return Err(QuireError::bad_request(UNSUPPORTED_IMAGE).into_anyhow());
    }

    let mut urls: HashMap<String, String> = HashMap::with_capacity(inline.len());
    let mut uploaded: Vec<String> = Vec::with_capacity(inline.len());
    for src in inline {
        let path = inline_image_path(Utc::now());
        match blobs.put_data_url(ctx, &path, &src).await {
            Ok(receipt) => {
                uploaded.push(receipt.key);
                urls.insert(src, receipt.url);
            }
            Err(err) => {
                tracing::warn!(%path, error = %err, "inline image upload failed");
                discard_uploads(blobs, &uploaded).await;
                let kind = if err.is_client_error() {
                    quire_core::ErrorKind::BadRequest
                } else {
                    quire_core::ErrorKind::BadGateway
                };
                return Err(QuireError::new(kind, IMAGE_UPLOAD_FAILED)
                    .with_source(blob_error(err))
                    .into_anyhow());
            }
        }
    }

    let rewritten = fragment.try_for_each_element_mut("img", |img| {
        if let Some(url) = img.attr("src").and_then(|src| urls.get(&src)) {
            img.set_attr("src", url);
        }
        Ok::<_, Infallible>(())
    });
    if let Err(never) = rewritten {
        match never {}
    }

    tracing::debug!(images = uploaded.len(), "externalized inline images");
    Ok(Externalized {
        content: fragment.to_html(),
        uploaded,
    })
}

/// Best-effort removal of blobs stored for a write that did not happen.
pub async fn discard_uploads(blobs: &BlobAdapter, keys: &[String]) {
    let results = join_all(keys.iter().map(|key| blobs.delete_key(key))).await;
    for (key, result) in keys.iter().zip(results) {
        if let Err(err) = result {
            tracing::warn!(%key, error = %err, "could not remove orphaned upload");
        }
    }
}
