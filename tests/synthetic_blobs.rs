//! End-to-end detection on synthetic Gaussian blobs.

use dogspot::lowlevel::{
    derive_scales, difference_of_gaussian, find_extrema, localize_subpixel, select_maxima,
};
use dogspot::{detect, Detector, DetectorConfig, Refinement, Spot, Volume};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

struct Blob {
    center: Vec<f64>,
    amplitude: f64,
}

/// Renders isotropic-in-physical-space Gaussian blobs whose characteristic
/// radius is `radius_px` pixels (per axis) on a constant background.
fn render(dims: &[usize], radius_px: &[f64], background: f64, blobs: &[Blob]) -> Volume<f32> {
    let n = dims.len() as f64;
    let sigma: Vec<f64> = radius_px.iter().map(|r| r / n.sqrt()).collect();
    let mut vol = Volume::filled(dims, 0.0f32).unwrap();
    let mut pos = vec![0usize; dims.len()];
    for v in vol.data_mut().iter_mut() {
        let mut value = background;
        for blob in blobs {
            let e: f64 = pos
                .iter()
                .zip(&blob.center)
                .zip(&sigma)
                .map(|((&p, &c), &s)| (p as f64 - c).powi(2) / (2.0 * s * s))
                .sum();
            value += blob.amplitude * (-e).exp();
        }
        *v = value as f32;
        for (p, &extent) in pos.iter_mut().zip(dims) {
            *p += 1;
            if *p < extent {
                break;
            }
            *p = 0;
        }
    }
    vol
}

fn nearest<'a>(spots: &'a [Spot], target: &[f64]) -> &'a Spot {
    spots
        .iter()
        .min_by(|a, b| {
            let da: f64 = a.position.iter().zip(target).map(|(p, t)| (p - t).powi(2)).sum();
            let db: f64 = b.position.iter().zip(target).map(|(p, t)| (p - t).powi(2)).sum();
            da.total_cmp(&db)
        })
        .unwrap()
}

fn four_blobs() -> Vec<Blob> {
    [
        (15.3, 14.6, 200.0),
        (40.7, 20.2, 150.0),
        (60.1, 45.8, 180.0),
        (20.5, 48.4, 120.0),
    ]
    .into_iter()
    .map(|(x, y, amplitude)| Blob {
        center: vec![x, y],
        amplitude,
    })
    .collect()
}

#[test]
fn finds_each_separated_blob_with_subpixel_accuracy() {
    let calibration = [0.5, 0.5];
    let blobs = four_blobs();
    let vol = render(&[80, 64], &[3.0, 3.0], 10.0, &blobs);
    let cfg = DetectorConfig {
        expected_radius: 1.5,
        threshold: 100.0,
        ..DetectorConfig::default()
    };

    let spots = detect(vol.view(), &calibration, &cfg).unwrap();
    assert_eq!(spots.len(), blobs.len());
    for blob in &blobs {
        let truth: Vec<f64> = blob.center.iter().zip(&calibration).map(|(c, k)| c * k).collect();
        let spot = nearest(&spots, &truth);
        for (axis, (&p, &t)) in spot.position.iter().zip(&truth).enumerate() {
            assert!(
                (p - t).abs() < 0.5 * calibration[axis],
                "axis {axis}: {p} vs {t}"
            );
        }
        assert_eq!(spot.radius, 1.5);
    }
}

#[test]
fn integer_positions_are_within_one_pixel() {
    let calibration = [0.5, 0.5];
    let blobs = four_blobs();
    let vol = render(&[80, 64], &[3.0, 3.0], 10.0, &blobs);
    let cfg = DetectorConfig {
        expected_radius: 1.5,
        threshold: 100.0,
        subpixel: false,
        ..DetectorConfig::default()
    };

    let spots = detect(vol.view(), &calibration, &cfg).unwrap();
    assert_eq!(spots.len(), blobs.len());
    for blob in &blobs {
        let truth: Vec<f64> = blob.center.iter().zip(&calibration).map(|(c, k)| c * k).collect();
        let spot = nearest(&spots, &truth);
        let dist: f64 = spot
            .position
            .iter()
            .zip(&truth)
            .map(|(p, t)| (p - t).powi(2))
            .sum::<f64>()
            .sqrt();
        assert!(dist < calibration[0]);
        for (&p, &k) in spot.position.iter().zip(&calibration) {
            let px = p / k;
            assert!((px - px.round()).abs() < 1e-9);
        }
    }
}

#[test]
fn spots_are_ordered_by_quality_and_brighter_ranks_first() {
    let blobs = four_blobs();
    let vol = render(&[80, 64], &[3.0, 3.0], 10.0, &blobs);
    let cfg = DetectorConfig {
        expected_radius: 3.0,
        threshold: 100.0,
        ..DetectorConfig::default()
    };
    let spots = detect(vol.view(), &[1.0, 1.0], &cfg).unwrap();
    assert!(spots.windows(2).all(|w| w[0].quality >= w[1].quality));
    let brightest = nearest(&spots, &[15.3, 14.6]);
    assert_eq!(brightest, &spots[0]);
}

#[test]
fn overlapping_blobs_keep_only_the_brighter() {
    let blobs = vec![
        Blob {
            center: vec![30.0, 30.0],
            amplitude: 200.0,
        },
        Blob {
            center: vec![34.0, 30.0],
            amplitude: 120.0,
        },
    ];
    let vol = render(&[64, 64], &[3.0, 3.0], 0.0, &blobs);
    let cfg = DetectorConfig {
        expected_radius: 3.0,
        threshold: 50.0,
        ..DetectorConfig::default()
    };
    let spots = detect(vol.view(), &[1.0, 1.0], &cfg).unwrap();
    assert_eq!(spots.len(), 1);
    assert!(spots[0].position[0] < 32.0);
}

#[test]
fn spots_never_overlap() {
    let mut rng = StdRng::seed_from_u64(11);
    let blobs: Vec<Blob> = (0..30)
        .map(|_| Blob {
            center: vec![rng.random_range(5.0..75.0), rng.random_range(5.0..75.0)],
            amplitude: rng.random_range(60.0..200.0),
        })
        .collect();
    let vol = render(&[80, 80], &[2.5, 2.5], 0.0, &blobs);
    let cfg = DetectorConfig {
        expected_radius: 2.5,
        threshold: 20.0,
        ..DetectorConfig::default()
    };
    let spots = detect(vol.view(), &[1.0, 1.0], &cfg).unwrap();
    assert!(!spots.is_empty());
    for (i, a) in spots.iter().enumerate() {
        for b in &spots[i + 1..] {
            let d = a.squared_distance_to(b).sqrt();
            assert!(d >= a.radius + b.radius, "{d}");
        }
    }
}

#[test]
fn raising_threshold_only_removes_spots() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut blobs = Vec::new();
    for gy in 0..4 {
        for gx in 0..4 {
            blobs.push(Blob {
                center: vec![
                    12.0 + 20.0 * gx as f64 + rng.random_range(-1.5..1.5),
                    12.0 + 20.0 * gy as f64 + rng.random_range(-1.5..1.5),
                ],
                amplitude: rng.random_range(40.0..220.0),
            });
        }
    }
    let mut vol = render(&[84, 84], &[3.0, 3.0], 10.0, &blobs);
    for v in vol.data_mut() {
        *v += rng.random_range(-1.0f32..1.0);
    }

    let mut previous: Option<Vec<Spot>> = None;
    for threshold in [15.0f32, 40.0, 80.0, 150.0, 250.0] {
        let cfg = DetectorConfig {
            expected_radius: 3.0,
            threshold,
            ..DetectorConfig::default()
        };
        let spots = detect(vol.view(), &[1.0, 1.0], &cfg).unwrap();
        if let Some(prev) = &previous {
            assert!(spots.len() <= prev.len());
            for spot in &spots {
                assert!(prev.iter().any(|p| p.position == spot.position));
            }
        }
        previous = Some(spots);
    }
    assert!(previous.unwrap().is_empty());
}

#[test]
fn refined_positions_stay_within_a_pixel_of_their_peak() {
    let mut rng = StdRng::seed_from_u64(5);
    let blobs: Vec<Blob> = (0..20)
        .map(|_| Blob {
            center: vec![rng.random_range(4.0..60.0), rng.random_range(4.0..60.0)],
            amplitude: rng.random_range(30.0..200.0),
        })
        .collect();
    let mut vol = render(&[64, 64], &[2.0, 2.0], 5.0, &blobs);
    for v in vol.data_mut() {
        *v += rng.random_range(-3.0f32..3.0);
    }

    let scales = derive_scales(2.0, &[1.0, 1.0]);
    let response = difference_of_gaussian(vol.view(), &scales, false).unwrap();
    let maxima = select_maxima(find_extrema(response.view()), vol.view(), 0.0).unwrap();
    assert!(!maxima.is_empty());
    let count = maxima.len();
    let refined = localize_subpixel(response.view(), maxima, 4).unwrap();
    assert_eq!(refined.len(), count);
    assert!(refined.iter().any(|r| r.status == Refinement::Converged));
    for r in &refined {
        for (&p, &o) in r.position.iter().zip(&r.peak.position) {
            assert!((p - o as f64).abs() < 1.0);
        }
    }
}

#[test]
fn uniform_image_yields_no_spots() {
    let vol = Volume::filled(&[32, 32], 50u16).unwrap();
    let cfg = DetectorConfig {
        expected_radius: 2.0,
        threshold: 60.0,
        ..DetectorConfig::default()
    };
    let spots = detect(vol.view(), &[1.0, 1.0], &cfg).unwrap();
    assert!(spots.is_empty());
}

#[test]
fn detects_anisotropic_blobs_in_3d() {
    let calibration = [0.2, 0.2, 0.5];
    let radius = 0.8;
    let radius_px: Vec<f64> = calibration.iter().map(|c| radius / c).collect();
    let blobs = vec![
        Blob {
            center: vec![10.4, 12.2, 7.6],
            amplitude: 100.0,
        },
        Blob {
            center: vec![24.0, 24.0, 8.3],
            amplitude: 80.0,
        },
    ];
    let vol = render(&[32, 32, 16], &radius_px, 0.0, &blobs);
    let cfg = DetectorConfig {
        expected_radius: radius,
        threshold: 40.0,
        ..DetectorConfig::default()
    };
    let spots = detect(vol.view(), &calibration, &cfg).unwrap();
    assert_eq!(spots.len(), 2);
    for blob in &blobs {
        let truth: Vec<f64> = blob.center.iter().zip(&calibration).map(|(c, k)| c * k).collect();
        let spot = nearest(&spots, &truth);
        for (axis, (&p, &t)) in spot.position.iter().zip(&truth).enumerate() {
            assert!((p - t).abs() < 0.5 * calibration[axis], "axis {axis}");
        }
    }
}

#[test]
fn median_prefilter_suppresses_hot_pixels() {
    let blobs = vec![Blob {
        center: vec![20.0, 20.0],
        amplitude: 150.0,
    }];
    let mut vol = render(&[48, 48], &[3.0, 3.0], 10.0, &blobs);
    // Isolated hot pixels far from the blob.
    vol.data_mut()[5 + 48 * 40] = 400.0;
    vol.data_mut()[40 + 48 * 6] = 400.0;

    let plain = DetectorConfig {
        expected_radius: 3.0,
        threshold: 100.0,
        ..DetectorConfig::default()
    };
    let filtered = DetectorConfig {
        use_median_filter: true,
        threshold_image: dogspot::ThresholdImage::Filtered,
        ..plain.clone()
    };

    let without = Detector::new(plain).detect(vol.view(), &[1.0, 1.0]).unwrap();
    let with = Detector::new(filtered).detect(vol.view(), &[1.0, 1.0]).unwrap();
    assert_eq!(without.len(), 3);
    assert_eq!(with.len(), 1);
    assert!((with[0].position[0] - 20.0).abs() < 0.5);
}
