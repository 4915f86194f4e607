use super::*;

#[test]
fn mul_div255_matches_rounding() {
    assert_eq!(mul_div255_u8(255, 255), 255);
    assert_eq!(mul_div255_u8(255, 0), 0);
    assert_eq!(mul_div255_u8(128, 128), 64);
}

#[test]
fn premultiply_then_unpremultiply_opaque_is_identity() {
    let src = vec![10u8, 20, 30, 255, 200, 100, 50, 255];
    let mut px = src.clone();
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(px, src);
    unpremultiply_rgba8_in_place(&mut px);
    assert_eq!(px, src);
}

#[test]
fn unpremultiply_recovers_half_alpha_within_one() {
    let mut px = vec![200u8, 100, 0, 128];
    premultiply_rgba8_in_place(&mut px);
    unpremultiply_rgba8_in_place(&mut px);
    assert!((i32::from(px[0]) - 200).abs() <= 1);
    assert!((i32::from(px[1]) - 100).abs() <= 1);
    assert_eq!(px[2], 0);
    assert_eq!(px[3], 128);
}

#[test]
fn transparent_pixels_are_zeroed() {
    let mut px = vec![9u8, 9, 9, 0];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(px, vec![0, 0, 0, 0]);
}
