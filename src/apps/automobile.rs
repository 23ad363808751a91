//! Automobile sales dashboard: yearly and recession-period statistics.

use super::{Component, Dashboard};
use crate::controls::{Control, ControlRegistry, ControlValue, DropdownOption};
use crate::data::Table;
use crate::ir::{ChartDescriptor, ChartKind, ChartRow, OutputId, OutputValue};
use crate::runtime::Dispatcher;
use crate::transform::{group_by, Aggregate};
use anyhow::{Context, Result};
use std::ops::RangeInclusive;
use std::sync::Arc;

pub const DEFAULT_SOURCE: &str = "https://cf-courses-data.s3.us.cloud-object-storage.appdomain.cloud/IBMDeveloperSkillsNetwork-DV0101EN-SkillsNetwork/Data%20Files/historical_automobile_sales.csv";

pub const YEARLY: &str = "Yearly Statistics";
pub const RECESSION: &str = "Recession Period Statistics";
pub const YEARS: RangeInclusive<i64> = 1980..=2023;

pub const STATISTICS_ID: &str = "dropdown-statistics";
pub const YEAR_ID: &str = "select-year";
pub const OUTPUT_ID: &str = "output-container";

const YEAR: &str = "Year";
const MONTH: &str = "Month";
const RECESSION_FLAG: &str = "Recession";
const VEHICLE_TYPE: &str = "Vehicle_Type";
const SALES: &str = "Automobile_Sales";
const AD_SPEND: &str = "Advertising_Expenditure";
const UNEMPLOYMENT: &str = "unemployment_rate";

/// The year dropdown only applies to the yearly report
pub fn year_selector_disabled(selected_statistics: Option<&str>) -> bool {
    selected_statistics != Some(YEARLY)
}

/// Charts for the output region, two rows of two.
///
/// Returns `None` when there is nothing to show yet: no report chosen, or the
/// yearly report without a year.
pub fn statistics_view(
    table: &Table,
    selected_statistics: Option<&str>,
    selected_year: Option<i64>,
) -> Result<Option<Vec<ChartRow>>> {
    match (selected_statistics, selected_year) {
        (Some(RECESSION), _) => recession_charts(table).map(Some),
        (Some(YEARLY), Some(year)) => yearly_charts(table, year).map(Some),
        _ => Ok(None),
    }
}

fn recession_charts(table: &Table) -> Result<Vec<ChartRow>> {
    let recession = table.filter_eq(RECESSION_FLAG, "1")?;

    let yearly = group_by(&recession, &[YEAR], SALES, Aggregate::Mean)?;
    let by_type = group_by(&recession, &[VEHICLE_TYPE], SALES, Aggregate::Mean)?;
    let spend = group_by(&recession, &[VEHICLE_TYPE], AD_SPEND, Aggregate::Sum)?;
    let unemployment = group_by(&recession, &[UNEMPLOYMENT, VEHICLE_TYPE], SALES, Aggregate::Mean)?;

    Ok(vec![
        ChartRow {
            charts: vec![
                ChartDescriptor::new(
                    ChartKind::Line,
                    "Average Automobile Sales Fluctuation Over Recession Period",
                    yearly,
                    YEAR,
                    SALES,
                ),
                ChartDescriptor::new(
                    ChartKind::Bar,
                    "Average Vehicles Sold by Vehicle Type (Recession)",
                    by_type,
                    VEHICLE_TYPE,
                    SALES,
                ),
            ],
        },
        ChartRow {
            charts: vec![
                ChartDescriptor::new(
                    ChartKind::Pie,
                    "Total Advertising Expenditure Share by Vehicle Type (Recession)",
                    spend,
                    VEHICLE_TYPE,
                    AD_SPEND,
                ),
                ChartDescriptor::new(
                    ChartKind::Bar,
                    "Effect of Unemployment Rate on Vehicle Type and Sales",
                    unemployment,
                    UNEMPLOYMENT,
                    SALES,
                )
                .color_by(VEHICLE_TYPE),
            ],
        },
    ])
}

fn yearly_charts(table: &Table, year: i64) -> Result<Vec<ChartRow>> {
    let year_data = table.filter_eq(YEAR, &year.to_string())?;

    // The trend line always spans every year in the table.
    let trend = group_by(table, &[YEAR], SALES, Aggregate::Mean)?;
    let monthly = group_by(&year_data, &[MONTH], SALES, Aggregate::Sum)?;
    let by_type = group_by(&year_data, &[VEHICLE_TYPE], SALES, Aggregate::Mean)?;
    let spend = group_by(&year_data, &[VEHICLE_TYPE], AD_SPEND, Aggregate::Sum)?;

    Ok(vec![
        ChartRow {
            charts: vec![
                ChartDescriptor::new(ChartKind::Line, "Yearly Average Automobile Sales", trend, YEAR, SALES),
                ChartDescriptor::new(
                    ChartKind::Line,
                    format!("Total Monthly Automobile Sales in {}", year),
                    monthly,
                    MONTH,
                    SALES,
                ),
            ],
        },
        ChartRow {
            charts: vec![
                ChartDescriptor::new(
                    ChartKind::Bar,
                    format!("Average Vehicles Sold by Vehicle Type in {}", year),
                    by_type,
                    VEHICLE_TYPE,
                    SALES,
                ),
                ChartDescriptor::new(
                    ChartKind::Pie,
                    format!("Total Advertising Expenditure by Vehicle Type in {}", year),
                    spend,
                    VEHICLE_TYPE,
                    AD_SPEND,
                ),
            ],
        },
    ])
}

pub fn controls() -> Vec<Control> {
    let statistics = Control::dropdown(
        STATISTICS_ID,
        vec![
            DropdownOption::new(YEARLY, ControlValue::text(YEARLY)),
            DropdownOption::new(RECESSION, ControlValue::text(RECESSION)),
        ],
        ControlValue::text(YEARLY),
    )
    .placeholder("Select a report type");

    let years = YEARS
        .map(|y| DropdownOption::new(y.to_string(), ControlValue::Int(y)))
        .collect();
    let year = Control::dropdown(YEAR_ID, years, ControlValue::Empty).placeholder("Select a year");

    vec![statistics, year]
}

/// Wire the automobile dashboard over an already loaded table
pub fn build(table: Arc<Table>) -> Result<Dashboard> {
    let mut registry = ControlRegistry::new();
    for control in controls() {
        registry.declare(control)?;
    }
    let mut dispatcher = Dispatcher::new(registry);

    dispatcher.register(OutputId::new(YEAR_ID, "disabled"), &[STATISTICS_ID], |values| {
        Ok(OutputValue::Flag(year_selector_disabled(values[0].as_text())))
    })?;

    dispatcher.register(
        OutputId::new(OUTPUT_ID, "children"),
        &[STATISTICS_ID, YEAR_ID],
        move |values| {
            let view = statistics_view(&table, values[0].as_text(), values[1].as_int())
                .context("Failed to build statistics charts")?;
            Ok(view.map_or(OutputValue::Nothing, OutputValue::Grid))
        },
    )?;

    Ok(Dashboard {
        title: "Automobile Statistics Dashboard".to_string(),
        layout: vec![
            Component::Heading("Automobile Sales Statistics Dashboard".to_string()),
            Component::Label("Select Statistics:".to_string()),
            Component::Control(STATISTICS_ID.to_string()),
            Component::Label("Select Year:".to_string()),
            Component::Control(YEAR_ID.to_string()),
            Component::Region(OUTPUT_ID.to_string()),
        ],
        dispatcher,
    })
}
