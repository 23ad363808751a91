use crate::apps::Dashboard;
use crate::controls::ControlValue;
use crate::graph::render_chart;
use crate::ir::{OutputId, OutputValue};
use crate::RenderOptions;
use anyhow::{anyhow, Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// Parse a `control-id=value` assignment. The value is read as JSON
/// (`1980`, `[0, 5000]`, `"ALL"`, `null`) and falls back to plain text.
pub fn parse_assignment(s: &str) -> std::result::Result<(String, ControlValue), String> {
    let (id, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected <control-id>=<value>, got '{}'", s))?;
    let value = serde_json::from_str(raw).unwrap_or_else(|_| ControlValue::text(raw));
    Ok((id.trim().to_string(), value))
}

/// Drive the dashboard to the given control values and write every chart it shows.
///
/// Files are named `<region>-<n>.<ext>`; returns the paths written.
pub fn write_snapshot(
    dashboard: &mut Dashboard,
    changes: &[(String, ControlValue)],
    out_dir: &Path,
    options: &RenderOptions,
) -> Result<Vec<PathBuf>> {
    let mut current: Vec<(OutputId, OutputValue)> = dashboard.dispatcher.initial()?;
    for (output, value) in dashboard.dispatcher.apply(changes)? {
        match current.iter_mut().find(|(o, _)| *o == output) {
            Some(slot) => slot.1 = value,
            None => current.push((output, value)),
        }
    }

    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    let mut written = Vec::new();
    for (output, value) in &current {
        if let OutputValue::Flag(flag) = value {
            info!("{} = {}", output, flag);
            continue;
        }
        for (n, chart) in value.charts().into_iter().enumerate() {
            let path = out_dir.join(format!("{}-{}.{}", output.id, n + 1, options.format.extension()));
            let bytes = render_chart(chart, options)
                .with_context(|| format!("Failed to render '{}'", chart.title))?;
            fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {} ({})", path.display(), chart.title);
            written.push(path);
        }
    }

    if written.is_empty() {
        return Err(anyhow!("No charts to write for the selected control values"));
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment_json() {
        assert_eq!(
            parse_assignment("select-year=1980").unwrap(),
            ("select-year".to_string(), ControlValue::Int(1980))
        );
        assert_eq!(
            parse_assignment("payload-slider=[0, 5000]").unwrap().1,
            ControlValue::Range(0.0, 5000.0)
        );
    }

    #[test]
    fn test_parse_assignment_text_fallback() {
        assert_eq!(
            parse_assignment("dropdown-statistics=Recession Period Statistics").unwrap().1,
            ControlValue::text("Recession Period Statistics")
        );
    }

    #[test]
    fn test_parse_assignment_missing_equals() {
        assert!(parse_assignment("select-year").is_err());
    }
}
