//! Python bindings for the dogspot DoG spot detector.
//!
//! Arrays arrive in numpy C order, so the last numpy axis varies fastest.
//! The binding reverses the shape to obtain the detector's axis-0-fastest
//! extents, and reverses calibrations and spot positions back so that Python
//! callers work in numpy axis order throughout.

use numpy::{Element, PyReadonlyArrayDyn, PyUntypedArrayMethods};
use pyo3::exceptions::{PyRuntimeError, PyTypeError, PyValueError};
use pyo3::prelude::*;

use dogspot::{
    DetectError, Detector as RustDetector, DetectorConfig as RustDetectorConfig, DogError,
    MedianFilter, Sample, Spot as RustSpot, ThresholdImage, VolumeView,
};

/// Convert a detection failure to a Python exception.
fn to_py_err(err: DetectError) -> PyErr {
    PyRuntimeError::new_err(err.to_string())
}

fn config_err(err: DogError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Detected spot in physical units, coordinates in numpy axis order.
#[pyclass]
#[derive(Clone)]
pub struct Spot {
    /// Center position, one entry per numpy axis.
    #[pyo3(get)]
    pub position: Vec<f64>,
    /// Detection quality; larger is stronger.
    #[pyo3(get)]
    pub quality: f64,
    /// Radius the detector searched for.
    #[pyo3(get)]
    pub radius: f64,
}

#[pymethods]
impl Spot {
    fn __repr__(&self) -> String {
        let pos: Vec<String> = self.position.iter().map(|p| format!("{p:.3}")).collect();
        format!(
            "Spot(position=[{}], quality={:.4}, radius={})",
            pos.join(", "),
            self.quality,
            self.radius
        )
    }
}

impl From<RustSpot> for Spot {
    fn from(s: RustSpot) -> Self {
        let mut position = s.position;
        position.reverse();
        Self {
            position,
            quality: s.quality,
            radius: s.radius,
        }
    }
}

/// Detector settings.
#[pyclass]
#[derive(Clone)]
pub struct DetectorConfig {
    inner: RustDetectorConfig,
    median_radius: usize,
}

#[pymethods]
impl DetectorConfig {
    /// Create a new DetectorConfig.
    ///
    /// Args:
    ///     expected_radius: Blob radius in physical units (default: 5.0)
    ///     threshold: Minimum intensity at a peak (default: 0.0)
    ///     use_median_filter: Median-filter before detection (default: False)
    ///     median_radius: Median window half-width (default: 1)
    ///     subpixel: Sub-pixel localization (default: True)
    ///     threshold_image: "raw" or "filtered" (default: "raw")
    ///     max_subpixel_moves: Refinement move budget (default: 4)
    ///     parallel: Parallel convolution (default: False)
    #[new]
    #[pyo3(signature = (
        expected_radius = 5.0,
        threshold = 0.0,
        use_median_filter = false,
        median_radius = 1,
        subpixel = true,
        threshold_image = "raw",
        max_subpixel_moves = 4,
        parallel = false
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        expected_radius: f64,
        threshold: f32,
        use_median_filter: bool,
        median_radius: usize,
        subpixel: bool,
        threshold_image: &str,
        max_subpixel_moves: usize,
        parallel: bool,
    ) -> PyResult<Self> {
        let threshold_image = match threshold_image.to_lowercase().as_str() {
            "raw" => ThresholdImage::Raw,
            "filtered" => ThresholdImage::Filtered,
            _ => {
                return Err(PyValueError::new_err(
                    "threshold_image must be 'raw' or 'filtered'",
                ))
            }
        };
        let inner = RustDetectorConfig {
            expected_radius,
            threshold,
            use_median_filter,
            subpixel,
            threshold_image,
            max_subpixel_moves,
            parallel,
        };
        inner.validate().map_err(config_err)?;
        Ok(Self {
            inner,
            median_radius,
        })
    }

    /// Validate the configuration.
    fn validate(&self) -> PyResult<()> {
        self.inner.validate().map_err(config_err)
    }

    fn __repr__(&self) -> String {
        format!(
            "DetectorConfig(expected_radius={}, threshold={}, use_median_filter={}, subpixel={})",
            self.inner.expected_radius,
            self.inner.threshold,
            self.inner.use_median_filter,
            self.inner.subpixel
        )
    }
}

fn build_detector(config: Option<DetectorConfig>) -> RustDetector {
    let config = config.unwrap_or_else(|| DetectorConfig {
        inner: RustDetectorConfig::default(),
        median_radius: MedianFilter::default().radius,
    });
    RustDetector::new(config.inner).with_prefilter(MedianFilter {
        radius: config.median_radius,
    })
}

/// Calibration in detector axis order; defaults to 1 per axis.
fn detector_calibration(calibration: Option<Vec<f64>>, ndim: usize) -> Vec<f64> {
    match calibration {
        Some(mut c) => {
            c.reverse();
            c
        }
        None => vec![1.0; ndim],
    }
}

fn detect_typed<T: Sample + Element>(
    array: PyReadonlyArrayDyn<'_, T>,
    detector: &RustDetector,
    calibration: Option<Vec<f64>>,
) -> PyResult<Vec<Spot>> {
    let mut dims = array.shape().to_vec();
    dims.reverse();
    let data = array.as_slice()?;
    let view = VolumeView::new(data, &dims).map_err(config_err)?;
    let calibration = detector_calibration(calibration, dims.len());
    let spots = detector.detect(view, &calibration).map_err(to_py_err)?;
    Ok(spots.into_iter().map(Spot::from).collect())
}

/// Detect spots in a 2D or 3D array.
///
/// Args:
///     image: C-contiguous numpy array of float32, float64, uint8 or uint16
///     calibration: Physical pixel size per numpy axis (default: all 1.0)
///     config: DetectorConfig (default: DetectorConfig())
///
/// Returns:
///     List of Spot objects, sorted by quality (best first)
#[pyfunction]
#[pyo3(signature = (image, calibration = None, config = None))]
fn detect(
    image: &Bound<'_, PyAny>,
    calibration: Option<Vec<f64>>,
    config: Option<DetectorConfig>,
) -> PyResult<Vec<Spot>> {
    let detector = build_detector(config);
    if let Ok(arr) = image.extract::<PyReadonlyArrayDyn<'_, f32>>() {
        return detect_typed(arr, &detector, calibration);
    }
    if let Ok(arr) = image.extract::<PyReadonlyArrayDyn<'_, u16>>() {
        return detect_typed(arr, &detector, calibration);
    }
    if let Ok(arr) = image.extract::<PyReadonlyArrayDyn<'_, u8>>() {
        return detect_typed(arr, &detector, calibration);
    }
    if let Ok(arr) = image.extract::<PyReadonlyArrayDyn<'_, f64>>() {
        return detect_typed(arr, &detector, calibration);
    }
    Err(PyTypeError::new_err(
        "image must be a float32, float64, uint8 or uint16 numpy array",
    ))
}

/// Load a grayscale image (up to 16 bit) and detect spots in it.
///
/// Args:
///     path: Path to an image file
///     calibration: Physical pixel size as [row, column] (default: [1, 1])
///     config: DetectorConfig (default: DetectorConfig())
#[pyfunction]
#[pyo3(signature = (path, calibration = None, config = None))]
fn detect_file(
    path: &str,
    calibration: Option<Vec<f64>>,
    config: Option<DetectorConfig>,
) -> PyResult<Vec<Spot>> {
    let detector = build_detector(config);
    let volume = dogspot::io::load_gray16_image(path).map_err(config_err)?;
    let calibration = detector_calibration(calibration, volume.dims().len());
    let spots = detector
        .detect(volume.view(), &calibration)
        .map_err(to_py_err)?;
    Ok(spots.into_iter().map(Spot::from).collect())
}

fn detect_frames_typed<'py, T: Sample + Element>(
    py: Python<'py>,
    frames: &[Bound<'py, PyAny>],
    detector: &RustDetector,
    calibration: Option<Vec<f64>>,
) -> PyResult<Vec<Vec<Spot>>> {
    let arrays = frames
        .iter()
        .map(|f| f.extract::<PyReadonlyArrayDyn<'py, T>>().map_err(PyErr::from))
        .collect::<PyResult<Vec<_>>>()
        .map_err(|_| PyTypeError::new_err("all frames must share one numpy dtype"))?;
    let dims: Vec<Vec<usize>> = arrays
        .iter()
        .map(|a| a.shape().iter().rev().copied().collect())
        .collect();
    let mut views = Vec::with_capacity(arrays.len());
    for (array, d) in arrays.iter().zip(&dims) {
        views.push(VolumeView::new(array.as_slice()?, d).map_err(config_err)?);
    }
    let ndim = dims.first().map_or(2, Vec::len);
    let calibration = detector_calibration(calibration, ndim);
    let results =
        py.allow_threads(|| dogspot::detect_frames(detector, &views, &calibration));
    results
        .into_iter()
        .map(|result| {
            result
                .map(|spots| spots.into_iter().map(Spot::from).collect())
                .map_err(to_py_err)
        })
        .collect()
}

/// Detect spots in every frame of a time series in parallel.
///
/// Args:
///     frames: List of arrays with identical dimensionality and one dtype
///         (float32, float64, uint8 or uint16)
///     calibration: Physical pixel size per numpy axis (default: all 1.0)
///     config: DetectorConfig (default: DetectorConfig())
///
/// Returns:
///     One list of Spot objects per frame
#[pyfunction]
#[pyo3(signature = (frames, calibration = None, config = None))]
fn detect_frames<'py>(
    py: Python<'py>,
    frames: Vec<Bound<'py, PyAny>>,
    calibration: Option<Vec<f64>>,
    config: Option<DetectorConfig>,
) -> PyResult<Vec<Vec<Spot>>> {
    let detector = build_detector(config);
    let Some(first) = frames.first() else {
        return Ok(Vec::new());
    };
    if first.extract::<PyReadonlyArrayDyn<'py, f32>>().is_ok() {
        return detect_frames_typed::<f32>(py, &frames, &detector, calibration);
    }
    if first.extract::<PyReadonlyArrayDyn<'py, u16>>().is_ok() {
        return detect_frames_typed::<u16>(py, &frames, &detector, calibration);
    }
    if first.extract::<PyReadonlyArrayDyn<'py, u8>>().is_ok() {
        return detect_frames_typed::<u8>(py, &frames, &detector, calibration);
    }
    if first.extract::<PyReadonlyArrayDyn<'py, f64>>().is_ok() {
        return detect_frames_typed::<f64>(py, &frames, &detector, calibration);
    }
    Err(PyTypeError::new_err(
        "frames must be float32, float64, uint8 or uint16 numpy arrays",
    ))
}

/// Python module for dogspot spot detection.
#[pymodule]
fn _dogspot(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Spot>()?;
    m.add_class::<DetectorConfig>()?;
    m.add_function(wrap_pyfunction!(detect, m)?)?;
    m.add_function(wrap_pyfunction!(detect_file, m)?)?;
    m.add_function(wrap_pyfunction!(detect_frames, m)?)?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
