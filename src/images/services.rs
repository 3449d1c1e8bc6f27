use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::storage::StorageClient;

/// A file picked in a form's image input.
#[derive(Debug, Clone)]
pub struct SelectedImage {
    pub file_name: String,
    pub content_type: String,
    pub body: Bytes,
}

/// State of an image input: the reference already saved for the record and
/// the newly picked file, if any.
#[derive(Debug, Default)]
pub struct ImageSelection {
    current: Option<String>,
    pending: Option<SelectedImage>,
    /// Set once the input has been touched; the saved reference no longer
    /// shows in the preview.
    picked: bool,
}

impl ImageSelection {
    pub fn with_existing(current: Option<String>) -> Self {
        Self {
            current,
            pending: None,
            picked: false,
        }
    }

    /// Picking a file replaces any earlier pick; picking nothing empties the preview.
    pub fn select(&mut self, file: Option<SelectedImage>) {
        self.pending = file;
        self.picked = true;
    }

    /// What the input shows: the saved reference until something is picked,
    /// then a `data:` URL of the picked file. Encoded on each call.
    pub fn preview(&self) -> Option<String> {
        if !self.picked {
            return self.current.clone();
        }
        self.pending
            .as_ref()
            .map(|f| data_url(&f.content_type, &f.body))
    }

    pub fn has_new_file(&self) -> bool {
        self.pending.is_some()
    }

    /// Uploads the pending file once and returns its public URL, or hands back
    /// the saved reference untouched when nothing new was picked.
    pub async fn resolve(
        self,
        st: &dyn StorageClient,
        folder: &str,
        owner: Uuid,
    ) -> anyhow::Result<Option<String>> {
        match self.pending {
            None => Ok(self.current),
            Some(img) => upload_image(st, folder, owner, img).await.map(Some),
        }
    }
}

pub async fn upload_image(
    st: &dyn StorageClient,
    folder: &str,
    owner: Uuid,
    img: SelectedImage,
) -> anyhow::Result<String> {
    let key = object_key(
        folder,
        owner,
        &img.file_name,
        &img.content_type,
        next_stamp(now_millis()),
        Uuid::new_v4(),
    );
    st.put_object(&key, img.body, &img.content_type)
        .await
        .with_context(|| format!("upload image {}", key))?;
    info!(%owner, key = %key, "image uploaded");
    Ok(st.public_url(&key))
}

pub fn data_url(content_type: &str, body: &[u8]) -> String {
    format!("data:{};base64,{}", content_type, STANDARD.encode(body))
}

pub fn is_image(content_type: &str) -> bool {
    content_type.starts_with("image/")
}

static LAST_STAMP: AtomicU64 = AtomicU64::new(0);

fn now_millis() -> u64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as u64
}

/// Strictly increasing across the process, never behind the wall clock.
fn next_stamp(now_ms: u64) -> u64 {
    let prev = LAST_STAMP
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| {
            Some(now_ms.max(prev + 1))
        })
        .unwrap_or_else(|p| p);
    now_ms.max(prev + 1)
}

fn object_key(
    folder: &str,
    owner: Uuid,
    file_name: &str,
    content_type: &str,
    stamp: u64,
    id: Uuid,
) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or_default();
    let (stem, orig_ext) = match base.rsplit_once('.') {
        Some((s, e)) if !s.is_empty() => (s, Some(e)),
        _ => (base, None),
    };
    let stem = sanitize(stem, 64);
    let stem = if stem.is_empty() { "image".to_string() } else { stem };
    let ext = ext_from_mime(content_type)
        .map(str::to_string)
        .or_else(|| orig_ext.map(|e| sanitize(e, 5).to_lowercase()).filter(|e| !e.is_empty()))
        .unwrap_or_else(|| "bin".to_string());
    let key = format!("{}/{}/{}-{}-{}.{}", folder, owner, stamp, id.simple(), stem, ext);
    debug!(key = %key, "object key");
    key
}

fn sanitize(s: &str, max: usize) -> String {
    let cleaned: String = s
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(max)
        .collect();
    cleaned.trim_matches('_').to_string()
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}
