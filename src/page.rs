//! HTML for the dashboard page and for region updates.

use crate::apps::{Component, Dashboard};
use crate::controls::{Control, ControlKind, ControlValue};
use crate::graph::render_svg;
use crate::ir::{ChartDescriptor, OutputValue};
use crate::RenderOptions;
use anyhow::{Context, Result};
use serde_json::Value;
use std::fmt::Write;

const CLIENT_SCRIPT: &str = include_str!("../assets/dashboard.js");

const STYLE: &str = "\
body { font-family: sans-serif; margin: 20px; }
h1 { text-align: center; color: #503D36; }
label, p { font-size: 20px; }
select { width: 80%; padding: 3px; font-size: 20px; text-align-last: center; margin-bottom: 20px; }
.range-slider { position: relative; width: 80%; margin: 10px 0 30px; }
.range-slider input { width: 100%; }
.range-slider .marks { position: relative; height: 1em; font-size: 12px; }
.range-slider .marks span { position: absolute; transform: translateX(-50%); }
.chart-row { display: flex; }
.chart { flex: 1; }
";

/// The full page: layout, controls with their defaults, and the client script
pub fn render_page(dash: &Dashboard) -> Result<String> {
    let registry = dash.dispatcher.registry();
    let mut body = String::new();
    for component in &dash.layout {
        match component {
            Component::Heading(text) => writeln!(body, "<h1>{}</h1>", escape_html(text))?,
            Component::Label(text) => writeln!(body, "<label>{}</label><br>", escape_html(text))?,
            Component::Paragraph(text) => writeln!(body, "<p>{}</p>", escape_html(text))?,
            Component::Break => writeln!(body, "<br>")?,
            Component::Control(id) => body.push_str(&render_control(registry.get(id)?)?),
            Component::Region(id) => {
                writeln!(body, "<div id=\"{}\" class=\"region\"></div>", escape_html(id))?
            }
        }
    }

    let controls: Vec<&Control> = registry.iter().collect();
    let controls_json = serde_json::to_string(&controls)
        .context("Failed to serialize controls")?
        .replace("</", "<\\/");

    Ok(format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>\n{style}</style>\n</head>\n<body>\n{body}<script>window.DASH_CONTROLS = {controls};</script>\n<script>\n{script}</script>\n</body>\n</html>\n",
        title = escape_html(&dash.title),
        style = STYLE,
        body = body,
        controls = controls_json,
        script = CLIENT_SCRIPT,
    ))
}

fn render_control(control: &Control) -> Result<String> {
    let mut out = String::new();
    let id = escape_html(&control.id);
    match &control.kind {
        ControlKind::Dropdown {
            options,
            placeholder,
            searchable,
            clearable,
        } => {
            writeln!(
                out,
                "<select id=\"{}\" class=\"control dropdown\" data-searchable=\"{}\">",
                id, searchable
            )?;
            if *clearable || control.default == ControlValue::Empty {
                let selected = if control.default == ControlValue::Empty { " selected" } else { "" };
                writeln!(
                    out,
                    "<option value=\"\"{}>{}</option>",
                    selected,
                    escape_html(placeholder.as_deref().unwrap_or(""))
                )?;
            }
            for (idx, option) in options.iter().enumerate() {
                let selected = if option.value == control.default { " selected" } else { "" };
                writeln!(
                    out,
                    "<option value=\"{}\"{}>{}</option>",
                    idx,
                    selected,
                    escape_html(&option.label)
                )?;
            }
            writeln!(out, "</select><br>")?;
        }
        ControlKind::RangeSlider {
            min,
            max,
            step,
            marks,
        } => {
            let (lo, hi) = control.default.as_range().unwrap_or((*min, *max));
            // Browsers snap values to the step grid, which would make max unreachable
            let step = if *step > 0.0 && ((max - min) % step).abs() < 1e-9 {
                step.to_string()
            } else {
                "any".to_string()
            };
            writeln!(out, "<div id=\"{}\" class=\"control range-slider\">", id)?;
            for (class, value) in [("lo", lo), ("hi", hi)] {
                writeln!(
                    out,
                    "<input type=\"range\" class=\"{}\" min=\"{}\" max=\"{}\" step=\"{}\" value=\"{}\">",
                    class, min, max, step, value
                )?;
            }
            writeln!(out, "<div class=\"marks\">")?;
            let span = if max > min { max - min } else { 1.0 };
            for (pos, label) in marks {
                writeln!(
                    out,
                    "<span style=\"left: {:.2}%\">{}</span>",
                    (pos - min) / span * 100.0,
                    escape_html(label)
                )?;
            }
            writeln!(out, "</div>\n<output class=\"range-label\">{} - {}</output>\n</div>", lo, hi)?;
        }
    }
    Ok(out)
}

/// Wire form of a region update: booleans stay booleans, charts become inline SVG markup
pub fn render_output(value: &OutputValue, options: &RenderOptions) -> Result<Value> {
    Ok(match value {
        OutputValue::Nothing => Value::String(String::new()),
        OutputValue::Flag(flag) => Value::Bool(*flag),
        OutputValue::Figure(chart) => Value::String(render_figure(chart, options)?),
        OutputValue::Grid(rows) => {
            let mut html = String::new();
            for row in rows {
                html.push_str("<div class=\"chart-row\" style=\"display: flex\">");
                for chart in &row.charts {
                    html.push_str(&render_figure(chart, options)?);
                }
                html.push_str("</div>");
            }
            Value::String(html)
        }
    })
}

fn render_figure(chart: &ChartDescriptor, options: &RenderOptions) -> Result<String> {
    let svg = render_svg(chart, options.width, options.height)
        .with_context(|| format!("Failed to render '{}'", chart.title))?;
    Ok(format!("<div class=\"chart\">{}</div>", svg))
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::DropdownOption;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">&</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
    }

    #[test]
    fn test_dropdown_markup() {
        let control = Control::dropdown(
            "select-year",
            vec![
                DropdownOption::new("1980", ControlValue::Int(1980)),
                DropdownOption::new("1981", ControlValue::Int(1981)),
            ],
            ControlValue::Empty,
        )
        .placeholder("Select a year");
        let html = render_control(&control).unwrap();
        assert!(html.contains("<option value=\"\" selected>Select a year</option>"));
        assert!(html.contains("<option value=\"1\">1981</option>"));
    }

    #[test]
    fn test_slider_markup() {
        let control = Control::range_slider("payload-slider", 0.0, 10000.0, 1000.0, vec![(5000.0, "5000".to_string())]);
        let html = render_control(&control).unwrap();
        assert!(html.contains("class=\"lo\""));
        assert!(html.contains("left: 50.00%"));
    }

    #[test]
    fn test_render_output_scalars() {
        let opts = RenderOptions::default();
        assert_eq!(render_output(&OutputValue::Flag(true), &opts).unwrap(), Value::Bool(true));
        assert_eq!(render_output(&OutputValue::Nothing, &opts).unwrap(), Value::String(String::new()));
    }
}
