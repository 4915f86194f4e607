use std::io::Cursor;

use super::*;
use crate::scene::model::Frame;

fn png(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([9, 9, 9, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn project_with_frames(n: usize) -> Project {
    let mut p = Project::default();
    for _ in 0..n {
        p.scene_mut().append_frame();
    }
    p
}

#[test]
fn defaults_match_editor_defaults() {
    let p = Project::default();
    assert_eq!(p.fps(), 12.0);
    assert_eq!(p.onion_depth(), 2);
    assert!((p.onion_alpha() - 0.3).abs() < 1e-12);
    assert_eq!(p.canvas(), Canvas::new(960, 540).unwrap());
    assert_eq!(p.background(), &Background::default());
    assert!(p.scene().is_empty());
}

#[test]
fn onion_scenario_depth_two() {
    let p = project_with_frames(3);
    let layers = p.onion_layers(2);
    assert_eq!(layers.len(), 2);
    assert_eq!(layers[0].0, 0);
    assert!((layers[0].1 - 0.15).abs() < 1e-6);
    assert_eq!(layers[1].0, 1);
    assert!((layers[1].1 - 0.3).abs() < 1e-6);
}

#[test]
fn onion_layers_skip_negative_indices_and_zero_depth() {
    let mut p = project_with_frames(3);
    let layers = p.onion_layers(0);
    assert!(layers.is_empty());
    let layers = p.onion_layers(1);
    assert_eq!(layers.len(), 1);
    assert_eq!(layers[0].0, 0);
    assert!((layers[0].1 - 0.3).abs() < 1e-6);

    p.set_onion_depth(0);
    assert!(p.onion_layers(2).is_empty());
}

#[test]
fn settings_are_clamped() {
    let mut p = Project::default();
    p.set_fps(500.0).unwrap();
    assert_eq!(p.fps(), MAX_FPS);
    p.set_fps(0.25).unwrap();
    assert_eq!(p.fps(), MIN_FPS);
    assert!(p.set_fps(0.0).is_err());
    assert!(p.set_fps(f64::NAN).is_err());

    p.set_onion_depth(99);
    assert_eq!(p.onion_depth(), MAX_ONION_DEPTH);
    p.set_onion_alpha(3.0).unwrap();
    assert_eq!(p.onion_alpha(), 1.0);
    p.set_onion_alpha(-1.0).unwrap();
    assert_eq!(p.onion_alpha(), 0.0);
}

#[test]
fn frame_timing_follows_fps() {
    let mut p = Project::default();
    assert_eq!(p.frame_interval(), Duration::from_secs_f64(1.0 / 12.0));
    p.set_fps(10.0).unwrap();
    assert_eq!(p.frame_interval(), Duration::from_millis(100));
}

#[test]
fn add_sprite_defaults_to_canvas_center_and_checks_asset() {
    let mut p = project_with_frames(1);
    let id = p.assets_mut().create_asset(png(4, 4)).unwrap();
    let idx = p.add_sprite(0, id.clone(), None).unwrap();
    let s = p.scene().sprite(0, idx).unwrap();
    assert_eq!(s.position(), Point::new(480.0, 270.0));

    assert!(
        p.add_sprite(0, AssetId("nope".to_string()), None)
            .is_err()
    );
    p.add_sprite(0, id, Some(Point::new(1.0, 2.0))).unwrap();
    assert_eq!(p.scene().sprite(0, 1).unwrap().position(), Point::new(1.0, 2.0));
}

#[test]
fn background_override_wins_for_its_frame_only() {
    let mut p = project_with_frames(2);
    let photo = Background::image(png(3, 3)).unwrap();
    p.scene_mut()
        .set_frame_background(1, Some(photo.clone()))
        .unwrap();
    assert_eq!(p.background_for(0), &Background::default());
    assert_eq!(p.background_for(1), &photo);
    assert_eq!(p.background_for(9), &Background::default());
}

#[test]
fn clear_frames_keeps_assets() {
    let mut p = project_with_frames(2);
    p.assets_mut().create_asset(png(1, 1)).unwrap();
    p.clear_frames();
    assert!(p.scene().is_empty());
    assert_eq!(p.scene().active_index(), 0);
    assert_eq!(p.assets().len(), 1);
    assert_eq!(p.scene().frames(), &[] as &[Frame]);
}
