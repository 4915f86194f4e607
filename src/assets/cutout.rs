//! Lasso cutouts: clip a source image to a user-drawn polygon and register the result.

use std::sync::Arc;

use crate::assets::decode::{decode_image, encode_png_premul};
use crate::assets::store::{AssetId, AssetStore, PreparedImage};
use crate::foundation::core::Point;
use crate::foundation::error::{PapercutError, PapercutResult};
use crate::render::raster::{ImagePaint, bezpath_to_cpu, polyline, surface_dims};

/// Smallest number of vertices that encloses an area.
pub const MIN_POLYGON_POINTS: usize = 3;

/// Clip `image_bytes` to `polygon` and register the masked image as a new asset.
///
/// The polygon is closed implicitly (last point connects to the first). The output keeps the
/// source's full dimensions; everything outside the polygon is fully transparent. A polygon that
/// misses the image entirely produces an empty, fully transparent asset.
#[tracing::instrument(skip(store, image_bytes, polygon), fields(points = polygon.len()))]
pub fn cutout(
    store: &mut AssetStore,
    image_bytes: &[u8],
    polygon: &[Point],
) -> PapercutResult<AssetId> {
    if polygon.len() < MIN_POLYGON_POINTS {
        return Err(PapercutError::InvalidPolygon(polygon.len()));
    }
    if polygon.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(PapercutError::validation("polygon points must be finite"));
    }

    let source = decode_image(image_bytes)?;
    let masked = clip_to_polygon(&source, polygon)?;
    let png = encode_png_premul(&masked.rgba8_premul, masked.width, masked.height)?;
    let id = store.insert_prepared(png, masked);
    tracing::info!(asset = %id, "cutout registered");
    Ok(id)
}

/// Rasterize only the pixels of `source` inside `polygon` onto a transparent surface.
pub(crate) fn clip_to_polygon(
    source: &PreparedImage,
    polygon: &[Point],
) -> PapercutResult<PreparedImage> {
    let (w, h) = surface_dims(source.width, source.height)?;
    let paint = ImagePaint::from_prepared(source)?;
    let path = bezpath_to_cpu(&polyline(polygon, true));

    let mut ctx = vello_cpu::RenderContext::new(w, h);
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(paint.paint);
    ctx.fill_path(&path);
    ctx.flush();

    let mut out = vello_cpu::Pixmap::new(w, h);
    ctx.render_to_pixmap(&mut out);

    Ok(PreparedImage {
        width: source.width,
        height: source.height,
        rgba8_premul: Arc::new(out.data_as_u8_slice().to_vec()),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/cutout.rs"]
mod tests;
