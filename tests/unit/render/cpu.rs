use std::io::Cursor;

use super::*;
use crate::assets::color::ColorDef;
use crate::assets::store::AssetId;
use crate::foundation::core::Canvas;

fn png_from(img: image::RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn solid_png(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    png_from(image::RgbaImage::from_pixel(w, h, image::Rgba(px)))
}

fn black_project() -> Project {
    let mut p = Project::new(Canvas::new(100, 100).unwrap());
    p.set_background(Background::color(ColorDef::rgba(0.0, 0.0, 0.0, 1.0)));
    p
}

/// Frame 0 has a red square at (20,20); frame 1 moves it to (80,80).
fn two_frame_project() -> Project {
    let mut p = black_project();
    let red = p
        .assets_mut()
        .create_asset(solid_png(10, 10, [255, 0, 0, 255]))
        .unwrap();
    p.scene_mut().append_frame();
    p.add_sprite(0, red, Some(Point::new(20.0, 20.0))).unwrap();
    p.scene_mut().append_frame();
    let original = p.scene().sprite(1, 0).unwrap().clone();
    p.scene_mut()
        .transform_sprite(
            1,
            0,
            &original,
            crate::scene::model::SpriteDelta::Drag { dx: 60.0, dy: 60.0 },
        )
        .unwrap();
    p
}

fn close(a: [u8; 4], b: [u8; 4], tol: u8) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x.abs_diff(*y) <= tol)
}

#[test]
fn default_background_fills_canvas() {
    let p = Project::new(Canvas::new(8, 4).unwrap());
    let frame = Compositor::default().render(&p, 0, None).unwrap();
    assert_eq!((frame.width, frame.height), (8, 4));
    assert!(frame.premultiplied);
    assert_eq!(frame.data.len(), 8 * 4 * 4);
    assert!(frame.data.chunks_exact(4).all(|px| px == [11, 14, 20, 255]));
}

#[test]
fn rendering_is_deterministic() {
    let p = two_frame_project();
    let mut a = Compositor::default();
    let mut b = Compositor::default();
    let first = a.render(&p, 1, None).unwrap();
    assert_eq!(first, a.render(&p, 1, None).unwrap());
    assert_eq!(first, b.render(&p, 1, None).unwrap());
}

#[test]
fn sprite_is_drawn_centered_on_its_position() {
    let mut p = two_frame_project();
    p.set_onion_depth(0);
    let frame = Compositor::default().render(&p, 0, None).unwrap();
    assert_eq!(frame.pixel(20, 20), Some([255, 0, 0, 255]));
    assert_eq!(frame.pixel(16, 16), Some([255, 0, 0, 255]));
    assert_eq!(frame.pixel(30, 30), Some([0, 0, 0, 255]));
    assert_eq!(frame.pixel(80, 80), Some([0, 0, 0, 255]));
}

#[test]
fn zero_onion_depth_renders_only_the_frame() {
    let mut p = two_frame_project();
    p.set_onion_depth(0);
    let with_history = Compositor::default().render(&p, 1, None).unwrap();

    let mut alone = two_frame_project();
    alone.set_onion_depth(0);
    alone.scene_mut().delete_frame(0).unwrap();
    let without_history = Compositor::default().render(&alone, 0, None).unwrap();

    assert_eq!(with_history, without_history);
}

#[test]
fn onion_skin_blends_previous_frame() {
    let mut p = two_frame_project();
    p.set_onion_depth(1);
    p.set_onion_alpha(0.5).unwrap();
    let frame = Compositor::default().render(&p, 1, None).unwrap();

    let ghost = frame.pixel(20, 20).unwrap();
    assert!(close(ghost, [128, 0, 0, 255], 2), "ghost pixel {ghost:?}");
    assert_eq!(frame.pixel(80, 80), Some([255, 0, 0, 255]));
}

#[test]
fn unknown_assets_are_skipped() {
    let mut p = two_frame_project();
    let plain = Compositor::default().render(&p, 0, None).unwrap();
    p.scene_mut()
        .add_sprite_to_frame(0, AssetId("gone".to_string()), Point::new(50.0, 50.0))
        .unwrap();
    let with_missing = Compositor::default().render(&p, 0, None).unwrap();
    assert_eq!(plain, with_missing);
}

#[test]
fn lasso_overlay_only_when_requested() {
    let p = black_project();
    let mut c = Compositor::default();
    let plain = c.render(&p, 0, None).unwrap();
    let empty = c.render(&p, 0, Some(&[])).unwrap();
    assert_eq!(plain, empty);

    let pts = [Point::new(10.0, 50.0), Point::new(90.0, 50.0)];
    let overlaid = c.render(&p, 0, Some(&pts)).unwrap();
    assert_ne!(plain, overlaid);
    // First dash covers x in [10, 15).
    assert_eq!(overlaid.pixel(12, 50), Some([0, 255, 0, 255]));
    // First gap covers x in [15, 20).
    assert_eq!(overlaid.pixel(17, 50), Some([0, 0, 0, 255]));
    assert_eq!(overlaid.pixel(12, 20), Some([0, 0, 0, 255]));
}

#[test]
fn background_image_is_letterboxed() {
    let mut img = image::RgbaImage::new(2, 1);
    img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
    img.put_pixel(1, 0, image::Rgba([0, 0, 255, 255]));
    let mut p = Project::new(Canvas::new(100, 100).unwrap());
    p.set_background(Background::image(png_from(img)).unwrap());

    let frame = Compositor::default().render(&p, 0, None).unwrap();
    assert!(close(frame.pixel(10, 50).unwrap(), [255, 0, 0, 255], 2));
    assert!(close(frame.pixel(90, 50).unwrap(), [0, 0, 255, 255], 2));
    assert_eq!(frame.pixel(50, 5), Some([0, 0, 0, 0]));
    assert_eq!(frame.pixel(50, 95), Some([0, 0, 0, 0]));
}

#[test]
fn frame_override_replaces_project_background() {
    let mut p = black_project();
    p.scene_mut().append_frame();
    p.scene_mut().append_frame();
    p.scene_mut()
        .set_frame_background(1, Some(Background::color(ColorDef::rgba(1.0, 1.0, 1.0, 1.0))))
        .unwrap();
    let mut c = Compositor::default();
    assert_eq!(c.render(&p, 0, None).unwrap().pixel(0, 0), Some([0, 0, 0, 255]));
    assert_eq!(
        c.render(&p, 1, None).unwrap().pixel(0, 0),
        Some([255, 255, 255, 255])
    );
}

#[test]
fn letterbox_fits_and_centers() {
    let a = letterbox(200, 100, 100, 100);
    let tl = a * Point::new(0.0, 0.0);
    let br = a * Point::new(200.0, 100.0);
    assert_eq!((tl.x, tl.y), (0.0, 25.0));
    assert_eq!((br.x, br.y), (100.0, 75.0));
}

#[test]
fn paint_cache_drops_images_that_are_gone() {
    let mut c = Compositor::default();
    {
        let p = two_frame_project();
        c.render(&p, 0, None).unwrap();
        assert_eq!(c.paints.len(), 1);
    }
    let empty = black_project();
    c.render(&empty, 0, None).unwrap();
    assert!(c.paints.is_empty());
}
