use std::io::Cursor;

use serde_json::json;

use super::*;
use crate::foundation::core::Point;

fn png(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(px));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn sample_project() -> Project {
    let mut p = Project::default();
    p.set_fps(8.0).unwrap();
    p.set_onion_depth(3);
    p.set_onion_alpha(0.5).unwrap();
    p.set_background(Background::color(ColorDef::parse("#336699").unwrap()));
    let hero = p.assets_mut().create_asset(png(6, 4, [255, 0, 0, 255])).unwrap();
    p.scene_mut().append_frame();
    p.add_sprite(0, hero.clone(), Some(Point::new(10.0, 20.0)))
        .unwrap();
    p.scene_mut().append_frame();
    let original = p.scene().sprite(1, 0).unwrap().clone();
    p.scene_mut()
        .transform_sprite(
            1,
            0,
            &original,
            crate::scene::model::SpriteDelta::Rotate { radians: 0.75 },
        )
        .unwrap();
    p.scene_mut()
        .set_frame_background(1, Some(Background::image(png(3, 3, [0, 0, 255, 255])).unwrap()))
        .unwrap();
    p
}

#[test]
fn save_load_round_trip_preserves_project() {
    let p = sample_project();
    let json = p.to_json().unwrap();
    let back = Project::from_json(&json).unwrap();

    assert_eq!(back.fps(), p.fps());
    assert_eq!(back.onion_depth(), p.onion_depth());
    assert_eq!(back.onion_alpha(), p.onion_alpha());
    assert_eq!(back.canvas(), p.canvas());
    assert_eq!(back.background(), p.background());
    assert_eq!(back.scene().frames(), p.scene().frames());
    assert_eq!(back.assets().len(), 1);

    let a = p.assets().iter().next().unwrap();
    let b = back.assets().get(a.id()).unwrap();
    assert_eq!(a.bytes(), b.bytes());
    assert_eq!((a.width(), a.height()), (b.width(), b.height()));
    assert_eq!(a.pivot(), b.pivot());
}

#[test]
fn empty_document_uses_defaults() {
    let p = Project::from_json("{}").unwrap();
    assert_eq!(p.fps(), 12.0);
    assert_eq!(p.onion_depth(), 2);
    assert!((p.onion_alpha() - 0.3).abs() < 1e-12);
    assert_eq!(p.canvas(), Canvas::default());
    assert_eq!(p.background(), &Background::default());
    assert!(p.assets().is_empty());
    assert!(p.scene().is_empty());
}

#[test]
fn legacy_field_names_are_accepted() {
    let src = to_data_url(&png(2, 2, [0, 255, 0, 255]));
    let doc = json!({
        "fps": 6,
        "onion": 4,
        "width": 320,
        "height": 200,
        "background": {"type": "color", "value": "#fff"},
        "assets": {
            "spr_7": {"src": src, "w": 2, "h": 2, "pivot": {"x": 0.5, "y": 0.5}}
        },
        "frames": [
            {"sprites": [{"id": "spr_7", "x": 1, "y": 2, "scale": 1.5, "rot": 0.25}]},
            {"sprites": [], "background": src}
        ]
    });
    let mut p = Project::from_json(&doc.to_string()).unwrap();

    assert_eq!(p.fps(), 6.0);
    assert_eq!(p.onion_depth(), 4);
    assert_eq!(p.canvas(), Canvas::new(320, 200).unwrap());
    assert_eq!(p.background(), &Background::color(ColorDef::rgba(1.0, 1.0, 1.0, 1.0)));

    let s = p.scene().sprite(0, 0).unwrap();
    assert_eq!(s.asset_id, AssetId("spr_7".to_string()));
    assert_eq!((s.x, s.y, s.scale, s.rotation), (1.0, 2.0, 1.5, 0.25));
    assert!(matches!(
        p.scene().frame(1).unwrap().background,
        Some(Background::Image(_))
    ));

    // Fresh ids continue after the persisted ones.
    let next = p.assets_mut().create_asset(png(1, 1, [0, 0, 0, 255])).unwrap();
    assert_eq!(next.as_str(), "spr_8");
}

#[test]
fn unreadable_assets_are_dropped_but_placements_kept() {
    let doc = json!({
        "assets": {
            "spr_0": {"imageData": "data:image/png;base64,AAAA", "width": 1, "height": 1},
            "spr_1": {"imageData": "not a data url", "width": 1, "height": 1}
        },
        "frames": [{"spritePlacements": [{"assetId": "spr_0", "x": 0, "y": 0}]}]
    });
    let p = Project::from_json(&doc.to_string()).unwrap();
    assert!(p.assets().is_empty());
    assert_eq!(p.scene().frame(0).unwrap().sprites.len(), 1);
    assert_eq!(p.scene().sprite(0, 0).unwrap().scale, 1.0);
}

#[test]
fn bad_color_falls_back_to_default() {
    let doc = json!({"background": {"kind": "color", "value": "chartreuse"}});
    let p = Project::from_json(&doc.to_string()).unwrap();
    assert_eq!(p.background(), &Background::default());
}

#[test]
fn invalid_documents_are_rejected() {
    assert!(matches!(
        Project::from_json("not json"),
        Err(PapercutError::Serde(_))
    ));
    assert!(Project::from_json(r#"{"canvasWidth": 0}"#).is_err());
    assert!(Project::from_json(r#"{"fps": -3}"#).is_err());
    let doc = json!({"frames": [{"spritePlacements": [{"assetId": "a", "scale": 0}]}]});
    assert!(Project::from_json(&doc.to_string()).is_err());
}

#[test]
fn serialized_field_names_are_canonical() {
    let json = sample_project().to_json().unwrap();
    let v: serde_json::Value = serde_json::from_str(&json).unwrap();
    for key in [
        "fps",
        "onionDepth",
        "onionAlpha",
        "canvasWidth",
        "canvasHeight",
        "background",
        "assets",
        "frames",
    ] {
        assert!(v.get(key).is_some(), "missing {key}");
    }
    assert_eq!(v["background"], json!({"kind": "color", "value": "#336699"}));
    let frame1 = &v["frames"][1];
    assert_eq!(frame1["backgroundOverride"]["kind"], "image");
    assert!(v["frames"][0].get("backgroundOverride").is_none());
    assert!(
        v["assets"]["spr_0"]["imageData"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,")
    );
}
