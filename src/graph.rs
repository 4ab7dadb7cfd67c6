use anyhow::{bail, Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;

use crate::aggregate::compare_cells;
use crate::ir::{ChartKind, ChartSpec, ColorEncoding, TextInfo};
use crate::palette;
use crate::{OutputFormat, RenderOptions};

const FONT: &str = "sans-serif";

/// Longest category label drawn under a bar before it is cut.
const MAX_LABEL_CHARS: usize = 18;

/// Render a chart to PNG or SVG bytes
pub fn render_chart(chart: &ChartSpec, options: &RenderOptions) -> Result<Vec<u8>> {
    let (width, height) = (options.width, options.height);
    if width == 0 || height == 0 {
        bail!("Render size must be non-zero, got {}x{}", width, height);
    }

    match options.format {
        OutputFormat::Png => {
            let Some(len) = (width as usize)
                .checked_mul(height as usize)
                .and_then(|pixels| pixels.checked_mul(3))
            else {
                bail!("Render size {}x{} is too large", width, height);
            };
            let mut buffer = vec![0u8; len];
            {
                let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
                draw_chart(&root, chart)?;
                root.present().context("Failed to present drawing")?;
            }
            encode_png(&buffer, width, height)
        }
        OutputFormat::Svg => {
            let mut svg = String::new();
            {
                let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
                draw_chart(&root, chart)?;
                root.present().context("Failed to present drawing")?;
            }
            Ok(svg.into_bytes())
        }
    }
}

fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let mut png_bytes = Vec::new();
    {
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(buffer, width, height, image::ColorType::Rgb8)
            .context("Failed to encode PNG")?;
    }
    Ok(png_bytes)
}

fn draw_chart<DB>(root: &DrawingArea<DB, Shift>, chart: &ChartSpec) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).context("Failed to fill background")?;
    let area = root
        .titled(&chart.title, (FONT, 20))
        .context("Failed to draw title")?;

    // Empty selections still get a titled frame.
    if chart.is_empty() {
        let (w, h) = area.dim_in_pixel();
        area.draw(&Text::new(
            "No data",
            ((w / 2) as i32 - 30, (h / 2) as i32),
            (FONT, 16),
        ))
        .context("Failed to draw empty notice")?;
        return Ok(());
    }

    match chart.kind {
        ChartKind::Pie => draw_pie(&area, chart),
        ChartKind::Bar => draw_bars(&area, chart),
        ChartKind::GroupedBar => draw_faceted_bars(&area, chart),
    }
}

fn draw_pie<DB>(area: &DrawingArea<DB, Shift>, chart: &ChartSpec) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (w, h) = area.dim_in_pixel();
    let center = ((w / 2) as i32, (h / 2) as i32);
    let radius = w.min(h) as f64 * 0.32;

    let sizes: Vec<f64> = chart.data.rows.iter().map(|r| r.value).collect();
    let names: Vec<String> = chart.data.rows.iter().map(|r| r.label()).collect();
    let colors = palette::cycle(series_colors(&chart.color), sizes.len());

    // Slice labels only for percent+label; otherwise names go to a legend.
    let on_slice = matches!(chart.text_info, Some(TextInfo::PercentLabel));
    let labels: Vec<String> = if on_slice {
        names.clone()
    } else {
        vec![String::new(); names.len()]
    };

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.label_style((FONT, 14).into_font().color(&BLACK));
    if chart.text_info.is_some() {
        pie.percentages((FONT, 12).into_font().color(&BLACK));
    }
    area.draw(&pie).context("Failed to draw pie")?;

    if !on_slice {
        for (i, (name, color)) in names.iter().zip(colors.iter()).enumerate() {
            let y = 10 + i as i32 * 20;
            area.draw(&Rectangle::new([(10, y), (24, y + 14)], color.filled()))
                .context("Failed to draw legend")?;
            area.draw(&Text::new(name.as_str(), (30, y), (FONT, 13)))
                .context("Failed to draw legend")?;
        }
    }

    Ok(())
}

fn draw_bars<DB>(area: &DrawingArea<DB, Shift>, chart: &ChartSpec) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let categories: Vec<String> = chart.data.rows.iter().map(|r| r.label()).collect();
    let values: Vec<f64> = chart.data.rows.iter().map(|r| r.value).collect();
    let num_categories = categories.len();

    let y_max = values.iter().cloned().fold(0.0, f64::max);
    let x_title = chart.x.as_ref().map(|a| a.title.as_str()).unwrap_or("");
    let y_title = chart.y.as_ref().map(|a| a.title.as_str()).unwrap_or("");

    let mut plot = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5..(num_categories as f64 - 0.5), 0.0..padded_max(y_max))
        .context("Failed to build chart")?;

    plot.configure_mesh()
        .disable_x_mesh()
        .x_labels(num_categories)
        .x_label_formatter(&|x| category_label(&categories, *x))
        .x_desc(x_title)
        .y_desc(y_title)
        .draw()
        .context("Failed to draw mesh")?;

    let color = bar_color(&chart.color);
    plot.draw_series(values.iter().enumerate().map(|(idx, &v)| {
        let x = idx as f64;
        Rectangle::new([(x - 0.4, 0.0), (x + 0.4, v)], color.filled())
    }))
    .context("Failed to draw bars")?;

    Ok(())
}

/// One horizontal bar panel per facet value, sharing the value axis.
fn draw_faceted_bars<DB>(area: &DrawingArea<DB, Shift>, chart: &ChartSpec) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let Some(facet) = &chart.facet else {
        bail!("Chart '{}' has no facet field", chart.id);
    };
    let Some(y_axis) = &chart.y else {
        bail!("Chart '{}' has no y binding", chart.id);
    };
    let facet_pos = chart
        .key_position(&facet.field)
        .with_context(|| format!("Facet field '{}' is not a key of chart '{}'", facet.field, chart.id))?;
    let y_pos = chart
        .key_position(&y_axis.field)
        .with_context(|| format!("Field '{}' is not a key of chart '{}'", y_axis.field, chart.id))?;

    let mut facets = chart.data.key_values(facet_pos);
    facets.sort_by(|a, b| compare_cells(a, b));
    let mut levels = chart.data.key_values(y_pos);
    levels.sort_by(|a, b| compare_cells(a, b));

    let colors = palette::cycle(series_colors(&chart.color), facets.len());
    let x_max = chart.data.rows.iter().map(|r| r.value).fold(0.0, f64::max);
    let x_title = chart.x.as_ref().map(|a| a.title.as_str()).unwrap_or("");

    let panels = area.split_evenly((1, facets.len()));
    for (i, (panel, facet_value)) in panels.iter().zip(facets.iter()).enumerate() {
        let mut plot = ChartBuilder::on(panel)
            .caption(facet_value, (FONT, 14))
            .margin(5)
            .x_label_area_size(40)
            .y_label_area_size(if i == 0 { 60 } else { 10 })
            .build_cartesian_2d(0.0..padded_max(x_max), -0.5..(levels.len() as f64 - 0.5))
            .context("Failed to build facet panel")?;

        let level_label = |y: &f64| category_label(&levels, *y);
        let mut mesh = plot.configure_mesh();
        mesh.disable_y_mesh()
            .x_labels(3)
            .y_labels(levels.len())
            .y_label_formatter(&level_label)
            .x_desc(x_title);
        if i == 0 {
            mesh.y_desc(y_axis.title.as_str());
        }
        mesh.draw().context("Failed to draw mesh")?;

        let color = colors[i];
        let bars = chart
            .data
            .rows
            .iter()
            .filter(|r| r.key.get(facet_pos) == Some(facet_value))
            .filter_map(|r| {
                let level = r.key.get(y_pos)?;
                let y = levels.iter().position(|l| l == level)? as f64;
                Some(Rectangle::new([(0.0, y - 0.4), (r.value, y + 0.4)], color.filled()))
            });
        plot.draw_series(bars).context("Failed to draw bars")?;
    }

    Ok(())
}

fn series_colors(encoding: &ColorEncoding) -> &[String] {
    match encoding {
        ColorEncoding::Sequence { colors } | ColorEncoding::Field { colors, .. } => colors.as_slice(),
        ColorEncoding::Fixed { .. } => &[],
    }
}

fn bar_color(encoding: &ColorEncoding) -> RGBColor {
    match encoding {
        ColorEncoding::Fixed { color } => palette::resolve(color),
        ColorEncoding::Sequence { colors } | ColorEncoding::Field { colors, .. } => {
            palette::cycle(colors, 1)[0]
        }
    }
}

/// Upper bound of a value axis that starts at zero.
fn padded_max(max: f64) -> f64 {
    if max <= 0.0 {
        1.0
    } else {
        max * 1.05
    }
}

/// Label for a tick on a category axis; blank between categories.
fn category_label(categories: &[String], pos: f64) -> String {
    let idx = pos.round();
    if (pos - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    match categories.get(idx as usize) {
        Some(label) if label.chars().count() > MAX_LABEL_CHARS => {
            let cut: String = label.chars().take(MAX_LABEL_CHARS - 1).collect();
            format!("{}…", cut)
        }
        Some(label) => label.clone(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{Aggregate, AggregateRow};
    use crate::compiler;

    fn counts(column: &str, pairs: &[(&str, usize)]) -> Aggregate {
        Aggregate {
            key_columns: vec![column.to_string()],
            value_column: "Count".to_string(),
            rows: pairs
                .iter()
                .map(|(k, n)| AggregateRow {
                    key: vec![k.to_string()],
                    value: *n as f64,
                    count: *n,
                })
                .collect(),
        }
    }

    fn is_valid_png(bytes: &[u8]) -> bool {
        bytes.len() > 8 && bytes[0..8] == [137, 80, 78, 71, 13, 10, 26, 10]
    }

    #[test]
    fn test_category_label() {
        let cats = vec!["A".to_string(), "PUGET SOUND ENERGY INC".to_string()];
        assert_eq!(category_label(&cats, 0.0), "A");
        assert_eq!(category_label(&cats, 0.5), "");
        assert_eq!(category_label(&cats, -1.0), "");
        assert_eq!(category_label(&cats, 2.0), "");
        let cut = category_label(&cats, 1.0);
        assert_eq!(cut.chars().count(), MAX_LABEL_CHARS);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn test_padded_max() {
        assert_eq!(padded_max(0.0), 1.0);
        assert!((padded_max(100.0) - 105.0).abs() < 1e-9);
    }

    #[test]
    fn test_bar_color() {
        let fixed = ColorEncoding::Fixed { color: "#0077cc".into() };
        assert_eq!(bar_color(&fixed), RGBColor(0, 119, 204));
        assert!(series_colors(&fixed).is_empty());
    }

    #[test]
    fn test_render_zero_size_fails() {
        let chart = compiler::compile_utility(counts("Electric Utility", &[("X", 1)]), "t".into());
        let options = RenderOptions { width: 0, ..RenderOptions::default() };
        assert!(render_chart(&chart, &options).is_err());
    }

    #[test]
    fn test_render_oversized_png_fails() {
        let chart = compiler::compile_utility(counts("Electric Utility", &[("X", 1)]), "t".into());
        let options = RenderOptions {
            width: u32::MAX,
            height: u32::MAX,
            format: OutputFormat::Png,
        };
        let err = render_chart(&chart, &options).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn test_render_bar_png() {
        let chart = compiler::compile_utility(
            counts("Electric Utility", &[("PUGET SOUND ENERGY INC", 3), ("CITY OF SEATTLE - (WA)", 1)]),
            "Utilities".into(),
        );
        let bytes = render_chart(&chart, &RenderOptions::default()).unwrap();
        assert!(is_valid_png(&bytes));
    }

    #[test]
    fn test_render_empty_chart_png() {
        let chart = compiler::compile_make_share(counts("Make", &[]), "Nothing".into());
        let bytes = render_chart(&chart, &RenderOptions::default()).unwrap();
        assert!(is_valid_png(&bytes));
    }

    #[test]
    fn test_render_pie_svg() {
        let chart = compiler::compile_type_share(counts("Electric Vehicle Type", &[("BEV", 3), ("PHEV", 1)]), "Types".into());
        let options = RenderOptions { format: OutputFormat::Svg, ..RenderOptions::default() };
        let bytes = render_chart(&chart, &options).unwrap();
        assert!(String::from_utf8(bytes).unwrap().contains("<svg"));
    }

    #[test]
    fn test_render_faceted_png() {
        let data = Aggregate {
            key_columns: vec!["Model Year".into(), "Make".into()],
            value_column: "Electric Range".into(),
            rows: vec![
                AggregateRow { key: vec!["2019".into(), "NISSAN".into()], value: 150.0, count: 1 },
                AggregateRow { key: vec!["2020".into(), "NISSAN".into()], value: 149.0, count: 1 },
                AggregateRow { key: vec!["2020".into(), "TESLA".into()], value: 306.5, count: 2 },
            ],
        };
        let chart = compiler::compile_range(data, "avg electric range of top 2 makes".into());
        let bytes = render_chart(&chart, &RenderOptions::default()).unwrap();
        assert!(is_valid_png(&bytes));
    }
}
