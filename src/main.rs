use clap::Parser;
use image::ImageReader;
use std::path::{Path, PathBuf};

use stacktally::{
    Binarize, DetectionParams, DetectionResult, Detector, DetectorConfig, Features, Preset, Region,
    detection::{annotate, roi},
    reconcile,
};

#[derive(Parser)]
#[command(name = "stacktally")]
#[command(about = "Count stacked or tiled objects in a photo")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Parameter preset: tiled, single, or sheets
    #[arg(long, default_value = "tiled")]
    mode: String,

    /// Restrict analysis to a rectangle, as X,Y,WIDTH,HEIGHT
    #[arg(long, value_name = "X,Y,W,H")]
    roi: Option<String>,

    /// Override the global brightness threshold (contour modes)
    #[arg(long)]
    threshold: Option<u8>,

    /// Override the minimum contour area (contour modes)
    #[arg(long)]
    min_area: Option<f64>,

    /// Override the minimum peak separation in rows (sheets mode)
    #[arg(long)]
    distance: Option<usize>,

    /// Override the minimum peak prominence (sheets mode)
    #[arg(long)]
    prominence: Option<f32>,

    /// Operator count overriding the suggestion
    #[arg(long)]
    manual: Option<u32>,

    /// Save the annotated image here
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// Save intermediate stage images to directory
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    if args.verbose {
        println!("Loading image: {:?}", args.image_path);
    }
    let img = ImageReader::open(&args.image_path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;
    if args.verbose {
        println!("Image loaded: {}x{}\n", img.width(), img.height());
    }

    let params = build_params(&args)?;
    let result = Detector::new(params.clone())
        .with_verbose(args.verbose)
        .detect(&img)?;

    println!("Suggested count: {}", result.count);
    if !result.found {
        match &params.detector {
            DetectorConfig::Contours(_) => {
                println!("Nothing detected. Try lowering the brightness threshold.")
            }
            DetectorConfig::Peaks(_) => {
                println!("Nothing detected. Try lowering the prominence gate.")
            }
        }
    }

    let outcome = reconcile(result.count, args.manual);
    if outcome.mismatch {
        println!(
            "Manual override: {} (suggested {})",
            outcome.accepted, outcome.suggested
        );
    }
    println!("Accepted count: {}", outcome.accepted);

    if let Some(path) = &args.out {
        result.annotated.save(path)?;
        if args.verbose {
            println!("Annotated image saved to {:?}", path);
        }
    }
    if let Some(dir) = &args.debug_out {
        save_debug(dir, &img, &params, &result)?;
        if args.verbose {
            println!("Stage images saved to {:?}", dir);
        }
    }

    Ok(())
}

fn build_params(args: &Cli) -> anyhow::Result<DetectionParams> {
    let preset = match args.mode.as_str() {
        "tiled" => Preset::TiledObjects,
        "single" => Preset::SingleObject,
        "sheets" => Preset::StackedSheets,
        other => anyhow::bail!("unknown mode: {other} (expected tiled, single, or sheets)"),
    };
    let mut params = preset.params();

    if let Some(text) = &args.roi {
        params.roi = Some(parse_roi(text)?);
    }
    match &mut params.detector {
        DetectorConfig::Contours(c) => {
            if let Some(t) = args.threshold {
                c.binarize = Binarize::Global { threshold: t };
            }
            if let Some(area) = args.min_area {
                c.min_area = area;
            }
        }
        DetectorConfig::Peaks(p) => {
            if let Some(d) = args.distance {
                p.min_distance = d;
            }
            if let Some(prom) = args.prominence {
                p.min_prominence = prom;
            }
        }
    }
    Ok(params)
}

fn parse_roi(text: &str) -> anyhow::Result<Region> {
    let parts = text
        .split(',')
        .map(|s| s.trim().parse::<i64>())
        .collect::<Result<Vec<_>, _>>()?;
    let &[x, y, w, h] = parts.as_slice() else {
        anyhow::bail!("expected four comma-separated values: X,Y,W,H");
    };
    anyhow::ensure!(w > 0 && h > 0, "ROI width and height must be positive");
    Ok(Region::new(x as i32, y as i32, w as u32, h as u32))
}

fn save_debug(
    dir: &Path,
    full: &image::DynamicImage,
    params: &DetectionParams,
    result: &DetectionResult,
) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)?;

    if let Some(region) = &params.roi {
        if let Some(clamped) = roi::clamp_to(full.width(), full.height(), region) {
            annotate::annotate_roi(full, &clamped).save(dir.join("00_search_area.png"))?;
        }
    }
    result.artifacts.normalized.save(dir.join("01_normalized.png"))?;
    if let Some(mask) = &result.artifacts.mask {
        mask.save(dir.join("02_mask.png"))?;
    }
    if let Some(edges) = &result.artifacts.edges {
        edges.save(dir.join("03_edges.png"))?;
    }
    result.annotated.save(dir.join("04_annotated.png"))?;

    if let Features::Peaks { raw, search, .. } = &result.features {
        let mut csv = String::from("row,raw,search\n");
        for (row, (a, b)) in raw.samples.iter().zip(&search.samples).enumerate() {
            csv.push_str(&format!("{row},{a},{b}\n"));
        }
        std::fs::write(dir.join("profile.csv"), csv)?;
    }

    Ok(())
}
