use dogspot::{
    detect, validate_calibration, DetectError, DetectorConfig, DogError, Stage, Volume,
    VolumeView,
};

#[test]
fn view_rejects_zero_extent() {
    let data = [0u8; 4];
    let err = VolumeView::new(&data, &[4, 0]).unwrap_err();
    assert_eq!(err, DogError::InvalidDimensions { dims: vec![4, 0] });
}

#[test]
fn view_rejects_buffer_size_mismatch() {
    let data = [0u16; 5];
    let err = VolumeView::new(&data, &[2, 3]).unwrap_err();
    assert_eq!(err, DogError::BufferSizeMismatch { needed: 6, got: 5 });
}

#[test]
fn volume_indexing_is_axis0_fastest() {
    let vol = Volume::from_vec((0u8..24).collect(), vec![4, 3, 2]).unwrap();
    let view = vol.view();
    assert_eq!(view.strides(), vec![1, 4, 12]);
    assert_eq!(view.get(&[1, 2, 1]), Some(&21));
    assert_eq!(view.get(&[4, 0, 0]), None);
    assert_eq!(view.index_of(&[3, 2, 1]), Some(23));
}

#[test]
fn conversion_preserves_values() {
    let vol = Volume::from_vec(vec![-3i16, 0, 7, 1000], vec![2, 2]).unwrap();
    let f = vol.view().to_f32().unwrap();
    assert_eq!(f.data(), &[-3.0, 0.0, 7.0, 1000.0]);
    assert_eq!(f.dims(), &[2, 2]);
}

#[test]
fn calibration_must_match_and_be_positive() {
    assert!(validate_calibration(&[1.0, 0.5], 2).is_ok());
    assert_eq!(
        validate_calibration(&[1.0], 2),
        Err(DogError::CalibrationMismatch {
            expected: 2,
            got: 1
        })
    );
    assert!(matches!(
        validate_calibration(&[1.0, f64::NAN], 2),
        Err(DogError::InvalidCalibration { axis: 1, .. })
    ));
    assert!(matches!(
        validate_calibration(&[-1.0, 1.0], 2),
        Err(DogError::InvalidCalibration { axis: 0, .. })
    ));
}

#[test]
fn detect_reports_input_stage_for_bad_calibration() {
    let vol = Volume::filled(&[8, 8], 1.0f32).unwrap();
    let err = detect(vol.view(), &[1.0, 0.0], &DetectorConfig::default()).unwrap_err();
    assert_eq!(err.stage, Stage::Input);
    assert!(err.to_string().starts_with("DogDetector: input: "));
}

#[test]
fn detect_rejects_non_positive_radius() {
    let vol = Volume::filled(&[8, 8], 1.0f32).unwrap();
    let cfg = DetectorConfig {
        expected_radius: 0.0,
        ..DetectorConfig::default()
    };
    let err: DetectError = detect(vol.view(), &[1.0, 1.0], &cfg).unwrap_err();
    assert_eq!(err.stage, Stage::Input);
    assert!(matches!(err.source, DogError::InvalidConfig(_)));
}

#[test]
fn default_config_matches_documented_values() {
    let cfg = DetectorConfig::default();
    assert_eq!(cfg.expected_radius, 5.0);
    assert_eq!(cfg.threshold, 0.0);
    assert!(!cfg.use_median_filter);
    assert!(cfg.subpixel);
    assert_eq!(cfg.max_subpixel_moves, 4);
    assert!(!cfg.parallel);
}

#[test]
fn tiny_volumes_are_handled() {
    let vol = Volume::from_vec(vec![0.0f32, 9.0, 0.0], vec![3, 1]).unwrap();
    let cfg = DetectorConfig {
        expected_radius: 1.0,
        ..DetectorConfig::default()
    };
    let spots = detect(vol.view(), &[1.0, 1.0], &cfg).unwrap();
    assert!(spots.len() <= 1);
    for s in &spots {
        assert!(s.position[0] >= 0.0 && s.position[0] <= 2.0);
    }
}
