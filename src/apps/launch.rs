//! Launch records dashboard: success share by site and payload vs. outcome.

use super::{Component, Dashboard};
use crate::controls::{Control, ControlRegistry, ControlValue, DropdownOption};
use crate::data::Table;
use crate::ir::{ChartDescriptor, ChartKind, OutputId, OutputValue};
use crate::runtime::Dispatcher;
use crate::transform::{group_by, Aggregate};
use anyhow::{anyhow, Context, Result};
use std::sync::Arc;

pub const DEFAULT_SOURCE: &str = "spacex_launch_dash.csv";

pub const ALL_SITES: &str = "ALL";

pub const SITE_ID: &str = "site-dropdown";
pub const PAYLOAD_ID: &str = "payload-slider";
pub const PIE_ID: &str = "success-pie-chart";
pub const SCATTER_ID: &str = "success-payload-scatter-chart";

const LAUNCH_SITE: &str = "Launch Site";
const PAYLOAD: &str = "Payload Mass (kg)";
const BOOSTER: &str = "Booster Version Category";
const CLASS: &str = "class";

const SLIDER_STEP: f64 = 1000.0;
const MARK_SPACING: usize = 5000;

/// Success share per site, or the success/failure split of one site
pub fn success_pie(table: &Table, selected_site: &str) -> Result<ChartDescriptor> {
    if selected_site == ALL_SITES {
        let by_site = group_by(table, &[LAUNCH_SITE], CLASS, Aggregate::Sum)?;
        Ok(ChartDescriptor::new(
            ChartKind::Pie,
            "Total Successful Launches by Site",
            by_site,
            LAUNCH_SITE,
            CLASS,
        ))
    } else {
        let site = table.filter_eq(LAUNCH_SITE, selected_site)?;
        let outcomes = group_by(&site, &[CLASS], CLASS, Aggregate::Count)?;
        Ok(ChartDescriptor::new(
            ChartKind::Pie,
            format!("Total Success vs. Failure for Site {}", selected_site),
            outcomes,
            CLASS,
            "count",
        ))
    }
}

/// Outcome against payload mass for launches inside `payload_range` (inclusive)
pub fn payload_scatter(table: &Table, selected_site: &str, payload_range: (f64, f64)) -> Result<ChartDescriptor> {
    let (lo, hi) = payload_range;
    let in_range = table.filter_range(PAYLOAD, lo, hi)?;

    let (data, title) = if selected_site == ALL_SITES {
        (in_range, "Correlation between Payload and Success for All Sites".to_string())
    } else {
        (
            in_range.filter_eq(LAUNCH_SITE, selected_site)?,
            format!("Correlation between Payload and Success for Site {}", selected_site),
        )
    };

    Ok(ChartDescriptor::new(ChartKind::Scatter, title, data, PAYLOAD, CLASS).color_by(BOOSTER))
}

/// "All Sites" followed by every site present in the data
pub fn site_options(table: &Table) -> Result<Vec<DropdownOption>> {
    let mut options = vec![DropdownOption::new("All Sites", ControlValue::text(ALL_SITES))];
    for site in table.distinct(LAUNCH_SITE)? {
        options.push(DropdownOption::new(site.clone(), ControlValue::Text(site)));
    }
    Ok(options)
}

/// Slider ticks every 5000 kg starting at the truncated minimum
pub fn payload_marks(min: f64, max: f64) -> Vec<(f64, String)> {
    let (start, end) = (min as i64, max as i64);
    (start..=end)
        .step_by(MARK_SPACING)
        .map(|v| (v as f64, v.to_string()))
        .collect()
}

pub fn controls(table: &Table) -> Result<Vec<Control>> {
    let site = Control::dropdown(SITE_ID, site_options(table)?, ControlValue::text(ALL_SITES))
        .placeholder("Select a Launch Site")
        .searchable(true)
        .clearable(false);

    let (min, max) = table.min_max(PAYLOAD)?;
    let payload = Control::range_slider(PAYLOAD_ID, min, max, SLIDER_STEP, payload_marks(min, max));

    Ok(vec![site, payload])
}

fn selected_site(value: &ControlValue) -> Result<&str> {
    value
        .as_text()
        .ok_or_else(|| anyhow!("Launch site must be text, got {}", value))
}

/// Wire the launch dashboard over an already loaded table
pub fn build(table: Arc<Table>) -> Result<Dashboard> {
    let mut registry = ControlRegistry::new();
    for control in controls(&table).context("Failed to derive launch controls from data")? {
        registry.declare(control)?;
    }
    let mut dispatcher = Dispatcher::new(registry);

    let pie_table = Arc::clone(&table);
    dispatcher.register(OutputId::new(PIE_ID, "figure"), &[SITE_ID], move |values| {
        let site = selected_site(&values[0])?;
        Ok(OutputValue::Figure(success_pie(&pie_table, site)?))
    })?;

    let scatter_table = Arc::clone(&table);
    dispatcher.register(
        OutputId::new(SCATTER_ID, "figure"),
        &[SITE_ID, PAYLOAD_ID],
        move |values| {
            let site = selected_site(&values[0])?;
            let range = values[1]
                .as_range()
                .ok_or_else(|| anyhow!("Payload range must be [min, max], got {}", values[1]))?;
            Ok(OutputValue::Figure(payload_scatter(&scatter_table, site, range)?))
        },
    )?;

    Ok(Dashboard {
        title: "SpaceX Launch Records Dashboard".to_string(),
        layout: vec![
            Component::Heading("SpaceX Launch Records Dashboard".to_string()),
            Component::Control(SITE_ID.to_string()),
            Component::Break,
            Component::Region(PIE_ID.to_string()),
            Component::Break,
            Component::Paragraph("Payload range (Kg):".to_string()),
            Component::Control(PAYLOAD_ID.to_string()),
            Component::Region(SCATTER_ID.to_string()),
        ],
        dispatcher,
    })
}
