use crate::config::ChartSettings;
use crate::error::{CliError, Result};
use aacomp::engine::report::{ChartImage, ImageFormat};
use aacomp::workflows::compare::ComparisonResult;
use plotters::coord::Shift;
use plotters::prelude::*;
use resvg::{tiny_skia, usvg};
use tracing::{debug, instrument};

type DrawResult = std::result::Result<(), Box<dyn std::error::Error>>;

const CAPTION_FONT: (&str, u32) = ("sans-serif", 22);
/// Share of each category slot covered by its bars.
const GROUP_WIDTH: f64 = 0.8;

pub const FREQUENCY_BAR: &str = "frequency-bar";
pub const FREQUENCY_LINE: &str = "frequency-line";
pub const RATIO_BAR: &str = "ratio-bar";
pub const RESIDUE_MEAN_BAR: &str = "residue-mean-bar";

/// Renders the comparison charts as SVG documents, or as PNG images for
/// report formats that cannot embed vector graphics.
#[derive(Debug, Clone, Copy)]
pub struct ChartRenderer {
    width: u32,
    height: u32,
    format: ImageFormat,
}

impl ChartRenderer {
    pub fn new(settings: &ChartSettings) -> Self {
        Self {
            width: settings.width,
            height: settings.height,
            format: ImageFormat::Svg,
        }
    }

    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    /// Renders every chart of a completed comparison.
    ///
    /// The composition charts are attached to the frequency table section and
    /// the ratio chart to the ratio table section; the residue mean chart
    /// becomes a section of its own.
    #[instrument(skip_all, name = "chart_rendering")]
    pub fn render_all(&self, result: &ComparisonResult) -> Result<Vec<ChartImage>> {
        let frequencies = result.frequency_table();
        let residues: Vec<String> = frequencies.residues().iter().map(char::to_string).collect();
        let frequency_series: Vec<(&str, &[f64])> = frequencies
            .proteins()
            .iter()
            .enumerate()
            .filter_map(|(idx, name)| frequencies.column(idx).map(|col| (name.as_str(), col)))
            .collect();

        let ratios = result.ratio_table();
        let ratio_names: Vec<String> = ratios.ratio_names().iter().map(|s| s.to_string()).collect();
        let ratio_series: Vec<(&str, &[f64])> = ratios
            .proteins()
            .iter()
            .enumerate()
            .filter_map(|(idx, name)| ratios.row(idx).map(|row| (name.as_str(), row.as_slice())))
            .collect();

        let means: Vec<f64> = result.residue_means().iter().map(|(_, mean)| mean).collect();
        let mean_labels: Vec<String> = result
            .residue_means()
            .iter()
            .map(|(symbol, _)| symbol.to_string())
            .collect();

        let images = vec![
            self.grouped_bars(
                FREQUENCY_BAR,
                &Axes {
                    title: "Amino acid composition",
                    x_desc: "Amino acid",
                    y_desc: "Relative frequency",
                },
                &residues,
                &frequency_series,
            )?
            .attached_to(result.frequency_section()),
            self.profile_lines(
                FREQUENCY_LINE,
                &Axes {
                    title: "Amino acid composition profile",
                    x_desc: "Amino acid",
                    y_desc: "Relative frequency",
                },
                &residues,
                &frequency_series,
            )?
            .attached_to(result.frequency_section()),
            self.grouped_bars(
                RATIO_BAR,
                &Axes {
                    title: "Specific residue ratios",
                    x_desc: "Ratio type",
                    y_desc: "Value",
                },
                &ratio_names,
                &ratio_series,
            )?
            .attached_to(result.ratio_section()),
            self.grouped_bars(
                RESIDUE_MEAN_BAR,
                &Axes {
                    title: "Mean relative frequency across proteins",
                    x_desc: "Amino acid",
                    y_desc: "Mean relative frequency",
                },
                &mean_labels,
                &[("mean", means.as_slice())],
            )?,
        ];

        debug!("Rendered {} chart(s).", images.len());
        match self.format {
            ImageFormat::Svg => Ok(images),
            ImageFormat::Png => {
                let mut options = usvg::Options::default();
                options.fontdb_mut().load_system_fonts();
                images.iter().map(|image| rasterize(image, &options)).collect()
            }
        }
    }

    fn grouped_bars(
        &self,
        name: &str,
        axes: &Axes,
        categories: &[String],
        series: &[(&str, &[f64])],
    ) -> Result<ChartImage> {
        let with_legend = series.len() > 1;
        self.draw(name, categories, |root| {
            root.fill(&WHITE)?;
            let mut chart = ChartBuilder::on(root)
                .caption(axes.title, CAPTION_FONT)
                .margin(20)
                .x_label_area_size(40)
                .y_label_area_size(60)
                .build_cartesian_2d(
                    (0..categories.len()).nested_coord(|_| 0f64..1.0),
                    0f64..y_upper(series),
                )?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(categories.len() + 1)
                .x_label_formatter(&|x| match x {
                    NestedValue::Category(idx) => categories.get(*idx).cloned().unwrap_or_default(),
                    NestedValue::Value(..) => String::new(),
                })
                .y_label_formatter(&|y| format!("{:.2}", y))
                .x_desc(axes.x_desc)
                .y_desc(axes.y_desc)
                .draw()?;

            let bar_width = GROUP_WIDTH / series.len().max(1) as f64;
            for (series_idx, (label, values)) in series.iter().enumerate() {
                let color = Palette99::pick(series_idx).to_rgba();
                let x0 = (1.0 - GROUP_WIDTH) / 2.0 + series_idx as f64 * bar_width;
                let anno = chart.draw_series(values.iter().enumerate().map(|(idx, value)| {
                    Rectangle::new(
                        [
                            (NestedValue::Value(idx, x0), 0.0),
                            (NestedValue::Value(idx, x0 + bar_width), *value),
                        ],
                        color.filled(),
                    )
                }))?;
                if with_legend {
                    anno.label(*label).legend(move |(x, y)| {
                        Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
                    });
                }
            }

            if with_legend {
                chart
                    .configure_series_labels()
                    .position(SeriesLabelPosition::UpperRight)
                    .background_style(WHITE.mix(0.8))
                    .border_style(BLACK)
                    .draw()?;
            }

            root.present()?;
            Ok(())
        })
    }

    fn profile_lines(
        &self,
        name: &str,
        axes: &Axes,
        categories: &[String],
        series: &[(&str, &[f64])],
    ) -> Result<ChartImage> {
        self.draw(name, categories, |root| {
            root.fill(&WHITE)?;
            let mut chart = ChartBuilder::on(root)
                .caption(axes.title, CAPTION_FONT)
                .margin(20)
                .x_label_area_size(40)
                .y_label_area_size(60)
                .build_cartesian_2d((0..categories.len()).into_segmented(), 0f64..y_upper(series))?;

            chart
                .configure_mesh()
                .x_labels(categories.len() + 1)
                .x_label_formatter(&|x| match x {
                    SegmentValue::CenterOf(idx) => categories.get(*idx).cloned().unwrap_or_default(),
                    _ => String::new(),
                })
                .y_label_formatter(&|y| format!("{:.2}", y))
                .x_desc(axes.x_desc)
                .y_desc(axes.y_desc)
                .draw()?;

            for (series_idx, (label, values)) in series.iter().enumerate() {
                let color = Palette99::pick(series_idx).to_rgba();
                let points = || {
                    values
                        .iter()
                        .enumerate()
                        .map(|(idx, v)| (SegmentValue::CenterOf(idx), *v))
                };
                chart
                    .draw_series(LineSeries::new(points(), color.stroke_width(2)))?
                    .label(*label)
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
                chart.draw_series(points().map(|p| Circle::new(p, 3, color.filled())))?;
            }

            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;

            root.present()?;
            Ok(())
        })
    }

    fn draw<F>(&self, name: &str, categories: &[String], paint: F) -> Result<ChartImage>
    where
        F: FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> DrawResult,
    {
        if categories.is_empty() {
            return Err(CliError::Chart {
                chart: name.to_string(),
                message: "no categories to plot".to_string(),
            });
        }
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (self.width, self.height)).into_drawing_area();
            paint(&root).map_err(|e| CliError::Chart {
                chart: name.to_string(),
                message: e.to_string(),
            })?;
        }
        Ok(ChartImage::new(name, ImageFormat::Svg, svg.into_bytes()))
    }
}

struct Axes {
    title: &'static str,
    x_desc: &'static str,
    y_desc: &'static str,
}

/// Renders an SVG chart to PNG; text is drawn with whatever system fonts are
/// installed.
fn rasterize(image: &ChartImage, options: &usvg::Options<'_>) -> Result<ChartImage> {
    let chart_error = |message: String| CliError::Chart {
        chart: image.name().to_string(),
        message,
    };
    let tree = usvg::Tree::from_data(image.data(), options).map_err(|e| chart_error(e.to_string()))?;
    let size = tree.size().to_int_size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height()).ok_or_else(|| {
        chart_error(format!("cannot allocate a {}x{} canvas", size.width(), size.height()))
    })?;
    pixmap.fill(tiny_skia::Color::WHITE);
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
    let png = pixmap.encode_png().map_err(|e| chart_error(e.to_string()))?;

    let rasterized = ChartImage::new(image.name(), ImageFormat::Png, png);
    Ok(match image.host() {
        Some(host) => rasterized.attached_to(host),
        None => rasterized,
    })
}

fn y_upper(series: &[(&str, &[f64])]) -> f64 {
    let max = series
        .iter()
        .flat_map(|(_, values)| values.iter().copied())
        .fold(0.0f64, f64::max);
    if max > 0.0 { max * 1.1 } else { 1.0 }
}
