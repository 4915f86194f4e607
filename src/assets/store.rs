use std::collections::BTreeMap;
use std::sync::Arc;

use crate::assets::decode::decode_image;
use crate::foundation::error::{PapercutError, PapercutResult};

#[derive(Clone, Debug)]
/// Prepared raster image in premultiplied RGBA8 form.
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Stable identifier of a registered sprite asset.
#[derive(
    Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct AssetId(pub String);

impl AssetId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

const ID_PREFIX: &str = "spr_";

/// Normalized anchor inside an asset's bounding box; `(0.5, 0.5)` is the center.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Pivot {
    pub x: f64,
    pub y: f64,
}

impl Pivot {
    pub fn new(x: f64, y: f64) -> Self {
        fn norm(v: f64) -> f64 {
            if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.5 }
        }
        Self {
            x: norm(x),
            y: norm(y),
        }
    }
}

impl Default for Pivot {
    fn default() -> Self {
        Self { x: 0.5, y: 0.5 }
    }
}

/// Write-once sprite image.
///
/// The encoded bytes are kept for persistence; the decoded pixels are cached next to them so the
/// render path never decodes.
#[derive(Clone, Debug)]
pub struct Asset {
    id: AssetId,
    bytes: Arc<Vec<u8>>,
    pivot: Pivot,
    image: PreparedImage,
}

impl Asset {
    pub fn id(&self) -> &AssetId {
        &self.id
    }

    /// Encoded image bytes as ingested (or as produced by a cutout).
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn width(&self) -> u32 {
        self.image.width
    }

    pub fn height(&self) -> u32 {
        self.image.height
    }

    pub fn pivot(&self) -> Pivot {
        self.pivot
    }

    /// Decoded premultiplied pixels.
    pub fn image(&self) -> &PreparedImage {
        &self.image
    }
}

/// Owns every sprite asset of a project, keyed by id.
#[derive(Clone, Debug, Default)]
pub struct AssetStore {
    assets: BTreeMap<AssetId, Asset>,
    next_seq: u64,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `bytes`, register them under a fresh id and return it.
    ///
    /// Nothing is registered when decoding fails.
    pub fn create_asset(&mut self, bytes: impl Into<Vec<u8>>) -> PapercutResult<AssetId> {
        let bytes = bytes.into();
        let image = decode_image(&bytes)?;
        Ok(self.insert_prepared(bytes, image))
    }

    /// Register already-decoded pixels together with their encoded form.
    pub(crate) fn insert_prepared(&mut self, bytes: Vec<u8>, image: PreparedImage) -> AssetId {
        let id = self.fresh_id();
        tracing::debug!(asset = %id, w = image.width, h = image.height, "asset registered");
        self.assets.insert(
            id.clone(),
            Asset {
                id: id.clone(),
                bytes: Arc::new(bytes),
                pivot: Pivot::default(),
                image,
            },
        );
        id
    }

    /// Re-register a persisted asset under its persisted id.
    pub fn insert_with_id(
        &mut self,
        id: AssetId,
        bytes: Vec<u8>,
        pivot: Pivot,
    ) -> PapercutResult<()> {
        if id.0.is_empty() {
            return Err(PapercutError::validation("asset id must be non-empty"));
        }
        if self.assets.contains_key(&id) {
            return Err(PapercutError::validation(format!(
                "asset id '{id}' is already registered"
            )));
        }
        let image = decode_image(&bytes)?;
        if let Some(seq) = id.0.strip_prefix(ID_PREFIX).and_then(|s| s.parse::<u64>().ok()) {
            self.next_seq = self.next_seq.max(seq.saturating_add(1));
        }
        self.assets.insert(
            id.clone(),
            Asset {
                id,
                bytes: Arc::new(bytes),
                pivot,
                image,
            },
        );
        Ok(())
    }

    pub fn get(&self, id: &AssetId) -> Option<&Asset> {
        self.assets.get(id)
    }

    pub fn contains(&self, id: &AssetId) -> bool {
        self.assets.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Assets in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.assets.values()
    }

    fn fresh_id(&mut self) -> AssetId {
        loop {
            let id = AssetId(format!("{ID_PREFIX}{}", self.next_seq));
            self.next_seq += 1;
            if !self.assets.contains_key(&id) {
                return id;
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
