use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use subword_seg::{render, SegmentConfig, SegmentError, Segmenter, ThresholdMethod};
use tracing::{error, info, warn};

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

#[derive(Parser)]
#[command(name = "subword-seg", about = "Split word images into ordered subwords")]
struct Cli {
    /// Input images or directories of images
    #[arg(short, long, required = true, num_args = 1..)]
    input: Vec<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Drop diacritic marks instead of attaching them to their stroke
    #[arg(long)]
    delete_diacritics: bool,

    /// Fixed brightness threshold (0-255). Overrides Otsu auto-detection.
    #[arg(long)]
    threshold: Option<u8>,

    /// Input is light ink on a dark background
    #[arg(long)]
    invert: bool,

    /// Median filter radius before thresholding (0 = off)
    #[arg(long, default_value = "1")]
    denoise: u32,

    /// Area ratio below which a mark over a stroke is a diacritic
    #[arg(long, default_value = "0.2")]
    diacritic_threshold: f64,

    /// Also write one tightly cropped image per subword
    #[arg(long)]
    crops: bool,

    /// Seed for overlay colors (random if omitted)
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    let config = SegmentConfig {
        threshold: match cli.threshold {
            Some(t) => ThresholdMethod::Fixed(t),
            None => ThresholdMethod::Otsu,
        },
        invert: cli.invert,
        denoise_radius: cli.denoise,
        diacritic_threshold: cli.diacritic_threshold,
        ..SegmentConfig::default()
    };
    let segmenter = Segmenter::new(config)?;

    let inputs = collect_inputs(&cli.input)?;
    if inputs.is_empty() {
        warn!("no input images found");
        return Ok(());
    }
    std::fs::create_dir_all(&cli.output)?;
    info!(images = inputs.len(), output = %cli.output.display(), "start");

    // Images share nothing, so they run in parallel.
    let failures = inputs
        .par_iter()
        .enumerate()
        .filter(|(index, path)| match process(&segmenter, path, *index, &cli) {
            Ok(n) => {
                info!(subwords = n, "{}", path.display());
                false
            }
            Err(e) => {
                error!("{}: {}", path.display(), e);
                true
            }
        })
        .count();

    if failures > 0 {
        return Err(format!("{} of {} images failed", failures, inputs.len()).into());
    }
    Ok(())
}

/// Segment one image and write its outputs. Returns the subword count.
fn process(segmenter: &Segmenter, path: &Path, index: usize, cli: &Cli) -> Result<usize, SegmentError> {
    let image = image::open(path).map_err(|e| SegmentError::ImageLoad(format!("{}: {}", path.display(), e)))?;
    let subwords = segmenter.segment(&image, cli.delete_diacritics)?;
    if subwords.is_empty() {
        warn!("{}: no subwords", path.display());
        return Ok(0);
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("image{}", index));
    let out = |suffix: &str| cli.output.join(format!("{}_{}.png", stem, suffix));

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
        None => StdRng::from_entropy(),
    };
    let overlay = segmenter.render_debug_overlay(&image, &subwords, &mut rng)?;
    save(&overlay, &out("overlay"))?;

    let stacked = render::render_vertical_composite(&subwords)?;
    save(&stacked, &out("vertical"))?;

    if cli.crops {
        for (n, crop) in render::render_tight_crops(&subwords)?.iter().enumerate() {
            save(crop, &out(&format!("subword_{:03}", n + 1)))?;
        }
    }
    Ok(subwords.len())
}

fn save<P, C>(img: &image::ImageBuffer<P, C>, path: &Path) -> Result<(), SegmentError>
where
    P: image::PixelWithColorType,
    [P::Subpixel]: image::EncodableLayout,
    C: std::ops::Deref<Target = [P::Subpixel]>,
{
    img.save(path)
        .map_err(|e| SegmentError::ImageWrite(format!("{}: {}", path.display(), e)))
}

/// Expand directories to their image files, in natural order.
fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, SegmentError> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = std::fs::read_dir(input)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && has_image_extension(p))
                .collect();
            found.sort_by(|a, b| natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()));
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Chunk {
    Number(u64),
    Text(String),
}

/// Alternating text and digit-run chunks, always starting and ending with
/// text. Digit runs compare by value, text case-insensitively.
fn natural_key(s: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut text = String::new();
    let mut digits = String::new();
    for ch in s.chars() {
        if ch.is_ascii_digit() {
            if digits.is_empty() {
                chunks.push(Chunk::Text(std::mem::take(&mut text).to_lowercase()));
            }
            digits.push(ch);
        } else {
            if !digits.is_empty() {
                chunks.push(Chunk::Number(digits.parse().unwrap_or(u64::MAX)));
                digits.clear();
            }
            text.push(ch);
        }
    }
    if !digits.is_empty() {
        chunks.push(Chunk::Number(digits.parse().unwrap_or(u64::MAX)));
    }
    chunks.push(Chunk::Text(text.to_lowercase()));
    chunks
}

fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_key(a).cmp(&natural_key(b))
}

fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_sort_by_value() {
        let mut names = vec!["word10.png", "word9.png", "Word1.png", "word100.png"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["Word1.png", "word9.png", "word10.png", "word100.png"]);
    }

    #[test]
    fn key_alternates_text_and_numbers() {
        assert_eq!(
            natural_key("10a2"),
            vec![
                Chunk::Text(String::new()),
                Chunk::Number(10),
                Chunk::Text("a".into()),
                Chunk::Number(2),
                Chunk::Text(String::new()),
            ]
        );
    }

    #[test]
    fn image_extensions_are_case_insensitive() {
        assert!(has_image_extension(Path::new("a/b.PNG")));
        assert!(has_image_extension(Path::new("b.tif")));
        assert!(!has_image_extension(Path::new("notes.txt")));
        assert!(!has_image_extension(Path::new("README")));
    }
}
