use clap::Parser;
use dogspot::io::load_gray16_image;
use dogspot::{detect_frames, Detector, DetectorConfig, Spot, ThresholdImage, Volume, VolumeView};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "DoG spot detector CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

/// How the listed images are interpreted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum InputMode {
    /// Each image is an independent 2D frame.
    #[default]
    Frames,
    /// The images are consecutive z-slices of one 3D stack.
    Stack,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ThresholdImageConfig {
    Raw,
    Filtered,
}

impl From<ThresholdImageConfig> for ThresholdImage {
    fn from(value: ThresholdImageConfig) -> Self {
        match value {
            ThresholdImageConfig::Raw => ThresholdImage::Raw,
            ThresholdImageConfig::Filtered => ThresholdImage::Filtered,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DetectorConfigJson {
    expected_radius: f64,
    threshold: f32,
    use_median_filter: bool,
    median_radius: usize,
    subpixel: bool,
    threshold_image: ThresholdImageConfig,
    max_subpixel_moves: usize,
    parallel: bool,
}

impl Default for DetectorConfigJson {
    fn default() -> Self {
        let cfg = DetectorConfig::default();
        Self {
            expected_radius: cfg.expected_radius,
            threshold: cfg.threshold,
            use_median_filter: cfg.use_median_filter,
            median_radius: dogspot::MedianFilter::default().radius,
            subpixel: cfg.subpixel,
            threshold_image: ThresholdImageConfig::Raw,
            max_subpixel_moves: cfg.max_subpixel_moves,
            parallel: cfg.parallel,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    image_paths: Vec<String>,
    mode: InputMode,
    calibration: Vec<f64>,
    output_path: Option<String>,
    detector: DetectorConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_paths: Vec::new(),
            mode: InputMode::Frames,
            calibration: Vec::new(),
            output_path: None,
            detector: DetectorConfigJson::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SpotRecord {
    position: Vec<f64>,
    quality: f64,
    radius: f64,
}

impl From<Spot> for SpotRecord {
    fn from(value: Spot) -> Self {
        Self {
            position: value.position,
            quality: value.quality,
            radius: value.radius,
        }
    }
}

#[derive(Debug, Serialize)]
struct FrameOutput {
    source: String,
    spots: Vec<SpotRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct Output {
    frames: Vec<FrameOutput>,
}

/// Concatenates equally sized 2D slices into one `[width, height, depth]`
/// stack.
fn stack_slices(slices: Vec<Volume<u16>>) -> Result<Volume<u16>, Box<dyn std::error::Error>> {
    let first = slices.first().ok_or("no slices to stack")?;
    let mut dims = first.dims().to_vec();
    for slice in &slices[1..] {
        if slice.dims() != dims.as_slice() {
            return Err(format!(
                "slice extent {:?} differs from {:?}",
                slice.dims(),
                dims
            )
            .into());
        }
    }
    dims.push(slices.len());
    let data: Vec<u16> = slices.into_iter().flat_map(Volume::into_vec).collect();
    Ok(Volume::from_vec(data, dims)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("dogspot=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.image_paths.is_empty() {
        return Err("image_paths must list at least one image".into());
    }

    let det = &config.detector;
    let detector = Detector::new(DetectorConfig {
        expected_radius: det.expected_radius,
        threshold: det.threshold,
        use_median_filter: det.use_median_filter,
        subpixel: det.subpixel,
        threshold_image: det.threshold_image.into(),
        max_subpixel_moves: det.max_subpixel_moves,
        parallel: det.parallel,
    })
    .with_prefilter(dogspot::MedianFilter {
        radius: det.median_radius,
    });

    let images = config
        .image_paths
        .iter()
        .map(load_gray16_image)
        .collect::<Result<Vec<_>, _>>()?;

    let frames = match config.mode {
        InputMode::Frames => {
            let calibration = if config.calibration.is_empty() {
                vec![1.0; 2]
            } else {
                config.calibration.clone()
            };
            let views: Vec<VolumeView<'_, u16>> = images.iter().map(Volume::view).collect();
            let results = detect_frames(&detector, &views, &calibration);
            tracing::info!(frames = results.len(), "detection finished");
            config
                .image_paths
                .iter()
                .zip(results)
                .map(|(path, result)| frame_output(path.clone(), result))
                .collect()
        }
        InputMode::Stack => {
            let calibration = if config.calibration.is_empty() {
                vec![1.0; 3]
            } else {
                config.calibration.clone()
            };
            let stack = stack_slices(images)?;
            let result = detector.detect(stack.view(), &calibration);
            vec![frame_output(config.image_paths.join(","), result)]
        }
    };

    let json = serde_json::to_string_pretty(&Output { frames })?;
    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}

fn frame_output(source: String, result: Result<Vec<Spot>, dogspot::DetectError>) -> FrameOutput {
    match result {
        Ok(spots) => FrameOutput {
            source,
            spots: spots.into_iter().map(SpotRecord::from).collect(),
            error: None,
        },
        Err(err) => FrameOutput {
            source,
            spots: Vec::new(),
            error: Some(err.to_string()),
        },
    }
}
