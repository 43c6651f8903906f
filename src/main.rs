//! A CLI tool for browsing a CT series as a volume: pick a plane and
//! slice, measure a region, and export the windowed view as an image.
use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use dicom_mpr::{IntensityHistogram, Plane, RegionOfInterest, Session, SortBy, WindowLevel};
use tracing::{Level, error};

/// Reslice a directory of CT DICOM files and summarize one cut
#[derive(Debug, Parser)]
struct App {
    /// Path to a directory of .dcm files
    directory: PathBuf,

    /// Reslicing plane: axial, coronal or sagittal
    #[arg(
        short = 'p',
        long = "plane",
        default_value = "axial",
        value_parser = Plane::from_str
    )]
    plane: Plane,

    /// Slice index along the plane (default is the middle slice)
    #[arg(short = 'i', long = "index")]
    index: Option<usize>,

    /// Slice ordering: slice-location, image-position, instance-number
    /// or file-order
    #[arg(
        long = "sort-by",
        default_value = "slice-location",
        value_parser = SortBy::from_str
    )]
    sort_by: SortBy,

    /// Region of interest on the slice, as row0,col0,row1,col1
    #[arg(long = "roi", value_parser = parse_roi)]
    roi: Option<RegionOfInterest>,

    /// Window as center,width (default is the CT preset 2000,4000)
    #[arg(short = 'w', long = "window", value_parser = parse_window)]
    window: Option<WindowLevel>,

    /// Print a 16-bin intensity histogram of the slice
    #[arg(long = "histogram")]
    histogram: bool,

    /// Path to the output image
    /// (default is the plane name with a `.png` extension)
    #[arg(short = 'o', long = "out")]
    output: Option<PathBuf>,

    /// Print more information about the series and the output file
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn parse_roi(value: &str) -> Result<RegionOfInterest, String> {
    let parts: Vec<usize> = value
        .split(',')
        .map(|part| part.trim().parse::<usize>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid region: {e}"))?;
    match parts[..] {
        [row_a, col_a, row_b, col_b] => Ok(RegionOfInterest::new((row_a, col_a), (row_b, col_b))),
        _ => Err("expected four values: row0,col0,row1,col1".into()),
    }
}

fn parse_window(value: &str) -> Result<WindowLevel, String> {
    let parts: Vec<f64> = value
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid window: {e}"))?;
    match parts[..] {
        [center, width] => Ok(WindowLevel::new(center, width)),
        _ => Err("expected two values: center,width".into()),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let app = App::parse();

    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(if app.verbose {
                Level::DEBUG
            } else {
                Level::INFO
            })
            .finish(),
    )
    .unwrap_or_else(|e| eprintln!("[ERROR] Could not set up global logging subscriber: {e}"));

    if let Err(e) = run(app).await {
        error!("{}", e);
        std::process::exit(-1);
    }
}

async fn run(app: App) -> Result<(), Box<dyn std::error::Error>> {
    let App {
        directory,
        plane,
        index,
        sort_by,
        roi,
        window,
        histogram,
        output,
        verbose,
    } = app;

    let mut session = Session::new();
    session.load_directory_async(&directory, sort_by).await?;

    if let Some(index) = index {
        session.set_index(plane, index)?;
    }
    if let Some(roi) = roi {
        session.set_roi(plane, roi);
    }

    if let (Some(patient), Some(study)) = (session.patient(), session.study()) {
        println!(
            "Patient: {} (id {}, age {}, sex {})",
            patient.name, patient.id, patient.age, patient.sex
        );
        println!(
            "Study:   {} on {}, body part {}",
            study.study_id, study.date, study.body_part
        );
    }

    let volume = session.volume().ok_or("no volume loaded")?;
    let (slices, rows, cols) = volume.dim();
    let (slice_mm, row_mm, col_mm) = volume.spacing();
    println!("Volume:  {slices}x{rows}x{cols} voxels, {slice_mm:.2}x{row_mm:.2}x{col_mm:.2} mm");
    if !volume.has_uniform_slice_spacing() {
        println!("         slice spacing is non-uniform, distances use the mean gap");
    }

    let slice = session.current_slice(plane).ok_or("no volume loaded")?;
    let (height_mm, width_mm) = slice.physical_size_mm();
    let (top, bottom, left, right) = plane.edge_labels();
    println!(
        "Slice:   {slice}, {height_mm:.1}x{width_mm:.1} mm, step {:.2} mm",
        slice.step_mm()
    );
    println!("Edges:   {top} on top, {bottom} below, {left} left, {right} right");

    if let Some(stats) = session.roi_stats() {
        println!(
            "Region:  mean {:.1} HU, sd {:.1} HU, area {:.1} mm^2",
            stats.mean, stats.std_dev, stats.area_mm2
        );
    }

    if histogram {
        let histogram = IntensityHistogram::from_slice(slice.data(), 16);
        println!(
            "Histogram: {:.0} HU to {:.0} HU in {:.0} HU bins",
            histogram.min,
            histogram.max,
            histogram.bin_width()
        );
        println!("         {:?}", histogram.bins);
    }

    let image = slice
        .to_image(window.unwrap_or_default())
        .ok_or("slice does not fit an image buffer")?;
    let output = output
        .unwrap_or_else(|| PathBuf::from(format!("{}.png", plane.to_string().to_lowercase())));
    image.save(&output)?;

    if verbose {
        println!("Image saved to {}", output.display());
    }

    Ok(())
}
