use super::*;

#[test]
fn surface_dims_bounds() {
    assert_eq!(surface_dims(960, 540).unwrap(), (960, 540));
    assert!(surface_dims(0, 1).is_err());
    assert!(surface_dims(70_000, 1).is_err());
}

#[test]
fn pixmap_round_trips_premul_bytes() {
    let bytes = vec![
        255u8, 0, 0, 255, //
        0, 64, 0, 128, //
    ];
    let pm = pixmap_from_premul_bytes(&bytes, 2, 1).unwrap();
    assert_eq!(pm.data_as_u8_slice(), bytes.as_slice());
    assert!(pixmap_from_premul_bytes(&bytes, 3, 1).is_err());
}

#[test]
fn clear_pixmap_fills_every_pixel() {
    let mut pm = vello_cpu::Pixmap::new(3, 2);
    clear_pixmap(&mut pm, [1, 2, 3, 255]);
    assert!(
        pm.data_as_u8_slice()
            .chunks_exact(4)
            .all(|px| px == [1, 2, 3, 255])
    );
}

#[test]
fn polyline_closes_on_request() {
    use kurbo::PathEl;

    let pts = [Point::new(0.0, 0.0), Point::new(4.0, 0.0), Point::new(0.0, 4.0)];
    let open = polyline(&pts, false);
    let closed = polyline(&pts, true);
    assert_eq!(open.elements().len(), 3);
    assert_eq!(closed.elements().len(), 4);
    assert!(matches!(closed.elements()[3], PathEl::ClosePath));
    assert!(polyline(&[], true).elements().is_empty());
}

#[test]
fn affine_conversion_preserves_coefficients() {
    let a = Affine::translate((3.0, 4.0)) * Affine::scale(2.0);
    assert_eq!(affine_to_cpu(a).as_coeffs(), a.as_coeffs());
}
