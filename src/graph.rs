use crate::ir::{ChartDescriptor, ChartKind};
use crate::palette::ColorPalette;
use crate::transform::partition;
use crate::{OutputFormat, RenderOptions};
use anyhow::{anyhow, Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::collections::HashSet;
use std::f64::consts::PI;
use std::ops::Range;

/// One colored group of (x, y) points
#[derive(Debug, Clone)]
struct Series {
    name: String,
    points: Vec<(String, f64)>,
}

/// Render a chart in the configured output format
pub fn render_chart(chart: &ChartDescriptor, options: &RenderOptions) -> Result<Vec<u8>> {
    match options.format {
        OutputFormat::Png => render_png(chart, options.width, options.height),
        OutputFormat::Svg => Ok(render_svg(chart, options.width, options.height)?.into_bytes()),
    }
}

/// Render a chart to an SVG document
pub fn render_svg(chart: &ChartDescriptor, width: u32, height: u32) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        draw_chart(&root, chart)?;
        root.present().map_err(drawing("present drawing"))?;
    }
    Ok(svg)
}

/// Render a chart to PNG bytes
pub fn render_png(chart: &ChartDescriptor, width: u32, height: u32) -> Result<Vec<u8>> {
    let mut buffer = vec![0u8; (width * height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        draw_chart(&root, chart)?;
        root.present().map_err(drawing("present drawing"))?;
    }

    let mut png_bytes = Vec::new();
    {
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(&buffer, width, height, image::ColorType::Rgb8)
            .context("Failed to encode PNG")?;
    }

    Ok(png_bytes)
}

fn draw_chart<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, chart: &ChartDescriptor) -> Result<()> {
    root.fill(&WHITE).map_err(drawing("fill background"))?;

    let series = collect_series(chart)
        .with_context(|| format!("Failed to prepare data for '{}'", chart.title))?;
    if series.iter().all(|s| s.points.is_empty()) {
        return draw_empty(root, &chart.title);
    }

    match chart.kind {
        ChartKind::Line => draw_xy(root, chart, &series, true),
        ChartKind::Scatter => draw_xy(root, chart, &series, false),
        ChartKind::Bar => draw_bars(root, chart, &series),
        ChartKind::Pie => draw_pie(root, &chart.title, &series),
    }
}

fn collect_series(chart: &ChartDescriptor) -> Result<Vec<Series>> {
    let data = &chart.data;
    let x_col = data.column(&chart.encoding.x)?;
    let y_col = data.column(&chart.encoding.y)?;

    let parts = match &chart.encoding.color {
        Some(color) => partition(data, color)?,
        None => vec![(String::new(), data.clone())],
    };

    let mut out = Vec::with_capacity(parts.len());
    for (name, part) in parts {
        let mut points = Vec::with_capacity(part.len());
        for idx in 0..part.len() {
            if let Some(y) = part.number(idx, y_col)? {
                points.push((part.cell(idx, x_col).to_string(), y));
            }
        }
        out.push(Series { name, points });
    }
    Ok(out)
}

/// Distinct x values across all series in first-seen order
fn categories(series: &[Series]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for s in series {
        for (x, _) in &s.points {
            if seen.insert(x.as_str()) {
                out.push(x.clone());
            }
        }
    }
    out
}

fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if min == max {
        (min - 1.0)..(max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        (min - padding)..(max + padding)
    }
}

fn draw_empty<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, title: &str) -> Result<()> {
    let area = root
        .titled(title, ("sans-serif", 18.0).into_font())
        .map_err(drawing("draw title"))?;
    let (w, h) = area.dim_in_pixel();
    area.draw(&Text::new(
        "No data",
        (w as i32 / 2 - 25, h as i32 / 2),
        ("sans-serif", 14.0).into_font(),
    ))
    .map_err(drawing("draw placeholder"))?;
    Ok(())
}

/// Line and scatter charts. A non-numeric x column is laid out by category index.
fn draw_xy<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    chart: &ChartDescriptor,
    series: &[Series],
    connect: bool,
) -> Result<()> {
    let numeric_x = series
        .iter()
        .flat_map(|s| s.points.iter())
        .all(|(x, _)| crate::data::parse_number(x).is_some());
    let cats = categories(series);
    let x_of = |x: &str| -> f64 {
        if numeric_x {
            crate::data::parse_number(x).unwrap_or_default()
        } else {
            cats.iter().position(|c| c == x).unwrap_or_default() as f64
        }
    };

    let x_range = padded_range(series.iter().flat_map(|s| s.points.iter()).map(|(x, _)| x_of(x.as_str())));
    let y_range = padded_range(series.iter().flat_map(|s| s.points.iter()).map(|(_, y)| *y));

    let mut ctx = ChartBuilder::on(root)
        .margin(10)
        .caption(&chart.title, ("sans-serif", 18))
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)
        .map_err(drawing("build chart"))?;

    let label_for = |x: &f64| -> String {
        if numeric_x {
            format!("{}", x)
        } else {
            let idx = x.round();
            if idx >= 0.0 && (idx as usize) < cats.len() && (x - idx).abs() < 1e-6 {
                cats[idx as usize].clone()
            } else {
                String::new()
            }
        }
    };
    let mut mesh = ctx.configure_mesh();
    mesh.x_desc(chart.encoding.x.as_str())
        .y_desc(chart.encoding.y.as_str())
        .x_label_formatter(&label_for);
    if !numeric_x {
        mesh.x_labels(cats.len());
    }
    mesh.draw().map_err(drawing("draw mesh"))?;

    for (idx, s) in series.iter().enumerate() {
        let color = ColorPalette::color(idx);
        let points: Vec<(f64, f64)> = s.points.iter().map(|(x, y)| (x_of(x.as_str()), *y)).collect();
        let anno = if connect {
            ctx.draw_series(LineSeries::new(points, color.stroke_width(2)))
                .map_err(drawing("draw line series"))?
        } else {
            ctx.draw_series(points.into_iter().map(|p| Circle::new(p, 4, color.filled())))
                .map_err(drawing("draw point series"))?
        };
        if chart.encoding.color.is_some() {
            anno.label(s.name.clone())
                .legend(move |(x, y)| Circle::new((x + 10, y), 4, color.filled()));
        }
    }

    if chart.encoding.color.is_some() {
        ctx.configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(drawing("draw legend"))?;
    }
    Ok(())
}

/// Bar chart on a categorical x axis; several series stack per category
fn draw_bars<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    chart: &ChartDescriptor,
    series: &[Series],
) -> Result<()> {
    let cats = categories(series);
    let num_categories = cats.len();

    // values[series][category], summed so repeated x values stack too
    let values: Vec<Vec<f64>> = series
        .iter()
        .map(|s| {
            let mut row = vec![0.0; num_categories];
            for (x, y) in &s.points {
                if let Some(idx) = cats.iter().position(|c| c == x) {
                    row[idx] += y;
                }
            }
            row
        })
        .collect();

    let totals = (0..num_categories).map(|c| values.iter().map(|row| row[c]).sum::<f64>());
    let y_max = totals.fold(0.0_f64, f64::max);
    let y_min = values.iter().flatten().fold(0.0_f64, |a, &b| a.min(b));
    let y_range = if y_max == y_min { y_min..(y_max + 1.0) } else { y_min..(y_max * 1.05) };

    let mut ctx = ChartBuilder::on(root)
        .margin(10)
        .caption(&chart.title, ("sans-serif", 18))
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..(num_categories as f64), y_range)
        .map_err(drawing("build chart"))?;

    ctx.configure_mesh()
        .x_labels(num_categories)
        .x_label_formatter(&|x| {
            let idx = *x as usize;
            if idx < cats.len() {
                cats[idx].clone()
            } else {
                String::new()
            }
        })
        .x_desc(chart.encoding.x.as_str())
        .y_desc(chart.encoding.y.as_str())
        .draw()
        .map_err(drawing("draw mesh"))?;

    let bar_width = 0.8;
    let mut stacked = vec![0.0; num_categories];
    for (series_idx, row) in values.iter().enumerate() {
        let color = ColorPalette::color(series_idx);
        let anno = ctx
            .draw_series(row.iter().enumerate().map(|(cat_idx, &y_val)| {
                let x_center = cat_idx as f64 + 0.5;
                let base = stacked[cat_idx];
                Rectangle::new(
                    [
                        (x_center - bar_width / 2.0, base),
                        (x_center + bar_width / 2.0, base + y_val),
                    ],
                    color.filled(),
                )
            }))
            .map_err(drawing("draw bars"))?;
        if chart.encoding.color.is_some() {
            anno.label(series[series_idx].name.clone())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }
        for (acc, y) in stacked.iter_mut().zip(row) {
            *acc += y;
        }
    }

    if chart.encoding.color.is_some() {
        ctx.configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(drawing("draw legend"))?;
    }
    Ok(())
}

/// Pie chart: one wedge per x value sized by its share of the y total.
/// Zero-valued slices get a legend entry but no wedge.
fn draw_pie<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, title: &str, series: &[Series]) -> Result<()> {
    let slices: Vec<(String, f64)> = series
        .iter()
        .flat_map(|s| s.points.iter().cloned())
        .filter(|(_, v)| *v >= 0.0)
        .collect();
    let total: f64 = slices.iter().map(|(_, v)| v).sum();
    if total <= 0.0 {
        return draw_empty(root, title);
    }

    let area = root
        .titled(title, ("sans-serif", 18.0).into_font())
        .map_err(drawing("draw title"))?;
    let (w, h) = area.dim_in_pixel();
    let (w, h) = (w as f64, h as f64);
    let center = (w * 0.35, h / 2.0);
    let radius = (w * 0.3).min(h * 0.42);

    let mut start = -PI / 2.0;
    for (idx, (name, value)) in slices.iter().enumerate() {
        let color = ColorPalette::color(idx);
        let sweep = value / total * 2.0 * PI;
        if sweep > 0.0 {
            let steps = ((sweep / (2.0 * PI) * 120.0).ceil() as usize).max(2);
            let mut points = vec![(center.0 as i32, center.1 as i32)];
            for step in 0..=steps {
                let angle = start + sweep * step as f64 / steps as f64;
                points.push((
                    (center.0 + radius * angle.cos()) as i32,
                    (center.1 + radius * angle.sin()) as i32,
                ));
            }
            area.draw(&Polygon::new(points, color.filled()))
                .map_err(drawing("draw wedge"))?;
        }

        let lx = (w * 0.72) as i32;
        let ly = 20 + idx as i32 * 22;
        area.draw(&Rectangle::new([(lx, ly), (lx + 14, ly + 14)], color.filled()))
            .map_err(drawing("draw legend"))?;
        area.draw(&Text::new(
            format!("{} ({:.1}%)", name, value / total * 100.0),
            (lx + 20, ly),
            ("sans-serif", 14.0).into_font(),
        ))
        .map_err(drawing("draw legend"))?;

        start += sweep;
    }
    Ok(())
}

fn drawing<E: std::fmt::Debug>(what: &'static str) -> impl FnOnce(E) -> anyhow::Error {
    move |e| anyhow!("Failed to {}: {:?}", what, e)
}
