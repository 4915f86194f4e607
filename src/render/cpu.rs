use std::collections::HashMap;
use std::sync::Arc;

use kurbo::{Stroke, StrokeOpts};

use crate::assets::store::PreparedImage;
use crate::foundation::core::{Affine, Point, Vec2};
use crate::foundation::error::PapercutResult;
use crate::render::backend::FrameRGBA;
use crate::render::raster::{
    ImagePaint, affine_to_cpu, bezpath_to_cpu, clear_pixmap, polyline, surface_dims,
};
use crate::scene::model::{Background, Frame};
use crate::scene::project::Project;

/// Options for the lasso overlay drawn on top of an editor frame.
#[derive(Clone, Debug)]
pub struct RenderOpts {
    /// Straight RGBA8 stroke color.
    pub lasso_rgba: [u8; 4],
    pub lasso_width: f64,
    /// Dash on/off lengths in canvas pixels.
    pub lasso_dash: [f64; 2],
}

impl Default for RenderOpts {
    fn default() -> Self {
        Self {
            lasso_rgba: [0, 255, 0, 255],
            lasso_width: 2.0,
            lasso_dash: [5.0, 5.0],
        }
    }
}

/// CPU compositor: turns one frame of a [`Project`] into premultiplied RGBA8 pixels.
///
/// The output depends only on the project state and the overlay argument. Decoded images are
/// converted into paints once and reused across renders while their pixels are alive.
pub struct Compositor {
    opts: RenderOpts,
    paints: HashMap<usize, CachedPaint>,
}

struct CachedPaint {
    // Holds the pixel buffer alive so its address cannot be reused by another image.
    pixels: Arc<Vec<u8>>,
    paint: ImagePaint,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(RenderOpts::default())
    }
}

impl Compositor {
    pub fn new(opts: RenderOpts) -> Self {
        Self {
            opts,
            paints: HashMap::new(),
        }
    }

    /// Render frame `frame_index` at canvas size.
    ///
    /// Layers, bottom to top: background (frame override or project default), onion-skin copies
    /// of up to `onion_depth` earlier frames, the frame's own sprites, and the lasso overlay when
    /// `lasso` is given. An out-of-range index renders just the project background.
    #[tracing::instrument(skip(self, project, lasso), fields(frames = project.scene().len()))]
    pub fn render(
        &mut self,
        project: &Project,
        frame_index: usize,
        lasso: Option<&[Point]>,
    ) -> PapercutResult<FrameRGBA> {
        let canvas = project.canvas();
        let (w, h) = surface_dims(canvas.width, canvas.height)?;

        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        clear_pixmap(&mut pixmap, [0, 0, 0, 0]);
        let mut ctx = vello_cpu::RenderContext::new(w, h);

        match project.background_for(frame_index) {
            Background::Color(c) => {
                let [r, g, b, a] = c.to_rgba8_straight();
                ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                    0.0,
                    0.0,
                    f64::from(canvas.width),
                    f64::from(canvas.height),
                ));
            }
            Background::Image(img) => {
                let fit = letterbox(img.image().width, img.image().height, canvas.width, canvas.height);
                self.draw_image(&mut ctx, img.image(), fit, 1.0)?;
            }
        }

        for (prev, alpha) in project.onion_layers(frame_index) {
            if let Some(frame) = project.scene().frame(prev) {
                self.draw_sprites(&mut ctx, project, frame, alpha)?;
            }
        }

        if let Some(frame) = project.scene().frame(frame_index) {
            self.draw_sprites(&mut ctx, project, frame, 1.0)?;
        }

        if let Some(points) = lasso.filter(|p| !p.is_empty()) {
            self.draw_lasso(&mut ctx, points);
        }

        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);
        self.prune();

        Ok(FrameRGBA {
            width: canvas.width,
            height: canvas.height,
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }

    fn draw_sprites(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        project: &Project,
        frame: &Frame,
        opacity: f32,
    ) -> PapercutResult<()> {
        if opacity <= 0.0 {
            return Ok(());
        }
        for sprite in &frame.sprites {
            let Some(asset) = project.assets().get(&sprite.asset_id) else {
                tracing::trace!(asset = %sprite.asset_id, "skipping placement of unknown asset");
                continue;
            };
            let pivot = asset.pivot();
            let transform = sprite.to_affine(asset.width(), asset.height(), pivot.x, pivot.y);
            self.draw_image(ctx, asset.image(), transform, opacity)?;
        }
        Ok(())
    }

    fn draw_image(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        image: &PreparedImage,
        transform: Affine,
        opacity: f32,
    ) -> PapercutResult<()> {
        let paint = self.paint_for(image)?;
        ctx.set_transform(affine_to_cpu(transform));
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(paint.paint);

        if opacity < 1.0 {
            ctx.push_opacity_layer(opacity);
        }
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(paint.w),
            f64::from(paint.h),
        ));
        if opacity < 1.0 {
            ctx.pop_layer();
        }
        Ok(())
    }

    fn draw_lasso(&self, ctx: &mut vello_cpu::RenderContext, points: &[Point]) {
        let style = Stroke::new(self.opts.lasso_width).with_dashes(0.0, self.opts.lasso_dash);
        let outline = kurbo::stroke(
            polyline(points, false).elements().iter().copied(),
            &style,
            &StrokeOpts::default(),
            0.1,
        );
        let [r, g, b, a] = self.opts.lasso_rgba;
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
        ctx.fill_path(&bezpath_to_cpu(&outline));
    }

    fn paint_for(&mut self, image: &PreparedImage) -> PapercutResult<ImagePaint> {
        let key = Arc::as_ptr(&image.rgba8_premul) as usize;
        if let Some(cached) = self.paints.get(&key) {
            return Ok(cached.paint.clone());
        }
        let paint = ImagePaint::from_prepared(image)?;
        self.paints.insert(
            key,
            CachedPaint {
                pixels: Arc::clone(&image.rgba8_premul),
                paint: paint.clone(),
            },
        );
        Ok(paint)
    }

    /// Drop paints whose source image no longer exists outside the cache.
    fn prune(&mut self) {
        self.paints
            .retain(|_, cached| Arc::strong_count(&cached.pixels) > 1);
    }
}

/// Uniform scale-to-fit that centers an `iw×ih` image inside a `cw×ch` canvas.
pub(crate) fn letterbox(iw: u32, ih: u32, cw: u32, ch: u32) -> Affine {
    let (iw, ih, cw, ch) = (f64::from(iw), f64::from(ih), f64::from(cw), f64::from(ch));
    let scale = (cw / iw).min(ch / ih);
    let offset = Vec2::new((cw - iw * scale) / 2.0, (ch - ih * scale) / 2.0);
    Affine::translate(offset) * Affine::scale(scale)
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
