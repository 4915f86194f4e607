use std::sync::Arc;

use crate::assets::store::PreparedImage;
use crate::foundation::core::{Affine, BezPath, Point};
use crate::foundation::error::{PapercutError, PapercutResult};

/// A decoded image ready to be used as a `vello_cpu` paint.
#[derive(Clone)]
pub(crate) struct ImagePaint {
    pub(crate) paint: vello_cpu::Image,
    pub(crate) w: u32,
    pub(crate) h: u32,
}

impl ImagePaint {
    pub(crate) fn from_prepared(img: &PreparedImage) -> PapercutResult<Self> {
        let pixmap = pixmap_from_premul_bytes(&img.rgba8_premul, img.width, img.height)?;
        Ok(Self {
            paint: vello_cpu::Image {
                image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
                sampler: vello_cpu::peniko::ImageSampler::default(),
            },
            w: img.width,
            h: img.height,
        })
    }
}

pub(crate) fn surface_dims(width: u32, height: u32) -> PapercutResult<(u16, u16)> {
    let w: u16 = width
        .try_into()
        .map_err(|_| PapercutError::render("surface width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| PapercutError::render("surface height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(PapercutError::render("surface width/height must be > 0"));
    }
    Ok((w, h))
}

pub(crate) fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> PapercutResult<vello_cpu::Pixmap> {
    let (w, h) = surface_dims(width, height)?;
    let expected = usize::from(w) * usize::from(h) * 4;
    if bytes.len() != expected {
        return Err(PapercutError::render(format!(
            "expected {expected} premultiplied bytes for {width}x{height}, got {}",
            bytes.len()
        )));
    }
    let pixels: Vec<vello_cpu::peniko::color::PremulRgba8> = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        })
        .collect();
    let translucent = pixels.iter().any(|px| px.a < 255);
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        translucent,
    ))
}

pub(crate) fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap, rgba_premul: [u8; 4]) {
    pixmap
        .data_as_u8_slice_mut()
        .chunks_exact_mut(4)
        .for_each(|px| px.copy_from_slice(&rgba_premul));
}

pub(crate) fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

/// Re-express a path in the renderer's own kurbo types.
pub(crate) fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;
    use vello_cpu::kurbo::PathEl as CpuEl;

    let pt = |p: Point| vello_cpu::kurbo::Point::new(p.x, p.y);
    path.elements()
        .iter()
        .map(|el| match *el {
            PathEl::MoveTo(p) => CpuEl::MoveTo(pt(p)),
            PathEl::LineTo(p) => CpuEl::LineTo(pt(p)),
            PathEl::QuadTo(a, b) => CpuEl::QuadTo(pt(a), pt(b)),
            PathEl::CurveTo(a, b, c) => CpuEl::CurveTo(pt(a), pt(b), pt(c)),
            PathEl::ClosePath => CpuEl::ClosePath,
        })
        .collect()
}

/// Polyline through `points`, optionally closed back to the first point.
pub(crate) fn polyline(points: &[Point], closed: bool) -> BezPath {
    let mut path = BezPath::new();
    let mut iter = points.iter();
    if let Some(first) = iter.next() {
        path.move_to(*first);
        for p in iter {
            path.line_to(*p);
        }
        if closed {
            path.close_path();
        }
    }
    path
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
