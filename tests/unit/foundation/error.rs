use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        PapercutError::decode("x")
            .to_string()
            .contains("decode error:")
    );
    assert!(
        PapercutError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        PapercutError::unsupported("x")
            .to_string()
            .contains("unsupported environment:")
    );
    assert!(
        PapercutError::InvalidPolygon(2)
            .to_string()
            .contains("got 2")
    );
    assert_eq!(
        PapercutError::NoSavedProject.to_string(),
        "no saved project found"
    );
}

#[test]
fn notices_are_classified() {
    assert!(PapercutError::NoSavedProject.is_notice());
    assert!(PapercutError::storage("read-only").is_notice());
    assert!(PapercutError::unsupported("no ffmpeg").is_notice());
    assert!(!PapercutError::decode("bad png").is_notice());
    assert!(!PapercutError::InvalidPolygon(1).is_notice());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = PapercutError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
