use log::{info, warn};
use palette::Srgb;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::PlotSettings;
use crate::dataset::Dataset;
use crate::error::{AnalysisError, Result, SaveError};
use crate::insights::Metric;

const MARKER_SIZE: i32 = 4;
const CAPTION_FONT_SIZE: u32 = 24;
const OPEN_ISSUES_COLOR: Srgb<u8> = Srgb::new(255, 127, 14);
const OPEN_ISSUES_ALT_COLOR: Srgb<u8> = Srgb::new(31, 119, 180);

/// The two scatter series, with watchers on the x axis.
///
/// Rows missing either coordinate are left out of that series.
#[derive(Debug, Clone, Default)]
pub struct ScatterData {
    pub forks: Vec<(f64, f64)>,
    pub open_issues: Vec<(f64, f64)>,
}

impl ScatterData {
    /// Extract both series; fails before any drawing if a metric column is unusable.
    pub fn from_dataset(dataset: &Dataset) -> Result<Self> {
        let watchers = dataset.numeric_column(Metric::Watchers.column())?;
        let forks = dataset.numeric_column(Metric::Forks.column())?;
        let open_issues = dataset.numeric_column(Metric::OpenIssues.column())?;

        Ok(Self {
            forks: pair(&watchers, &forks),
            open_issues: pair(&watchers, &open_issues),
        })
    }

    fn points(&self) -> impl Iterator<Item = &(f64, f64)> {
        self.forks.iter().chain(&self.open_issues)
    }
}

fn pair(xs: &[Option<f64>], ys: &[Option<f64>]) -> Vec<(f64, f64)> {
    xs.iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect()
}

/// A rendered engagement scatter plot, held in memory as an SVG document.
#[derive(Debug, Clone)]
pub struct Figure {
    svg: String,
    width: u32,
    height: u32,
}

impl Figure {
    pub fn render(data: &ScatterData, settings: &PlotSettings) -> Result<Self> {
        let (width, height) = settings.pixel_size();

        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
            draw_scatter(&root, data, settings)
                .map_err(|e| AnalysisError::Render(e.to_string()))?;
        }

        Ok(Self { svg, width, height })
    }

    pub fn svg(&self) -> &str {
        &self.svg
    }

    /// (width, height) in pixels
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Write the figure to `path`, choosing PNG or SVG from the extension.
    ///
    /// Never fails: problems are logged and reported in the outcome.
    pub fn save(&self, path: &Path) -> SaveOutcome {
        let path = path.to_path_buf();
        match self.write(&path) {
            Ok(()) => {
                info!("Figure saved to {}", path.display());
                SaveOutcome::Saved { path }
            }
            Err(error) => {
                warn!("Failed to save figure to {}: {error}", path.display());
                SaveOutcome::Failed { path, error }
            }
        }
    }

    fn write(&self, path: &Path) -> std::result::Result<(), SaveError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let bytes = match extension.as_str() {
            "svg" => self.svg.clone().into_bytes(),
            "png" => self.rasterize()?,
            other => return Err(SaveError::UnsupportedFormat(other.to_string())),
        };

        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn rasterize(&self) -> std::result::Result<Vec<u8>, SaveError> {
        let mut fontdb = resvg::usvg::fontdb::Database::new();
        fontdb.load_system_fonts();
        let options = resvg::usvg::Options {
            fontdb: Arc::new(fontdb),
            ..Default::default()
        };

        let tree = resvg::usvg::Tree::from_str(&self.svg, &options)?;
        let size = tree.size().to_int_size();

        let (width, height) = (size.width(), size.height());
        let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| SaveError::Raster(format!("cannot allocate {width}x{height} image")))?;
        pixmap.fill(resvg::tiny_skia::Color::WHITE);
        resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap.as_mut());

        pixmap
            .encode_png()
            .map_err(|e| SaveError::Raster(e.to_string()))
    }
}

/// Result of persisting a figure.
#[derive(Debug)]
pub enum SaveOutcome {
    Saved { path: PathBuf },
    Failed { path: PathBuf, error: SaveError },
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Saved { path } | Self::Failed { path, .. } => path,
        }
    }
}

/// A rendered figure together with what happened when saving it.
#[derive(Debug)]
pub struct PlotReport {
    pub figure: Figure,
    pub save: SaveOutcome,
}

fn to_rgb(color: Srgb<u8>) -> RGBColor {
    RGBColor(color.red, color.green, color.blue)
}

/// Default color of the open-issues series, kept distinct from the configured one.
fn open_issues_color(primary: Srgb<u8>) -> Srgb<u8> {
    if primary == OPEN_ISSUES_COLOR {
        OPEN_ISSUES_ALT_COLOR
    } else {
        OPEN_ISSUES_COLOR
    }
}

fn padded_range<'a>(values: impl Iterator<Item = &'a f64>) -> Range<f64> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    });

    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }

    let span = max - min;
    let pad = if span > 0.0 { span * 0.05 } else { 1.0 };
    (min - pad)..(max + pad)
}

fn draw_scatter<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    data: &ScatterData,
    settings: &PlotSettings,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;

    let forks_color = to_rgb(settings.color);
    let issues_color = to_rgb(open_issues_color(settings.color));

    let x_range = padded_range(data.points().map(|(x, _)| x));
    let y_range = padded_range(data.points().map(|(_, y)| y));

    let mut chart = ChartBuilder::on(root)
        .caption(&settings.title, ("sans-serif", CAPTION_FONT_SIZE))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc(settings.x_title.as_str())
        .y_desc(settings.y_title.as_str())
        .bold_line_style(BLACK.mix(0.2))
        .light_line_style(BLACK.mix(0.07))
        .draw()?;

    chart
        .draw_series(
            data.forks
                .iter()
                .map(|&point| Circle::new(point, MARKER_SIZE, forks_color.filled())),
        )?
        .label(Metric::Forks.label())
        .legend(move |(x, y)| Circle::new((x, y), MARKER_SIZE, forks_color.filled()));

    chart
        .draw_series(
            data.open_issues
                .iter()
                .map(|&point| Circle::new(point, MARKER_SIZE, issues_color.filled())),
        )?
        .label(Metric::OpenIssues.label())
        .legend(move |(x, y)| Circle::new((x, y), MARKER_SIZE, issues_color.filled()));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}
