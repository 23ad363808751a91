use crate::data::Table;
use serde::Serialize;

// =============================================================================
// Chart descriptors
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Pie,
    Scatter,
}

/// Column bindings for a chart.
/// For pie charts `x` names the slices and `y` holds their values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Encoding {
    pub x: String,
    pub y: String,
    pub color: Option<String>,
}

/// Aggregated data plus everything needed to draw it.
/// Built per event, rendered, and dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartDescriptor {
    pub kind: ChartKind,
    pub title: String,
    pub data: Table,
    pub encoding: Encoding,
}

impl ChartDescriptor {
    pub fn new(kind: ChartKind, title: impl Into<String>, data: Table, x: &str, y: &str) -> Self {
        Self {
            kind,
            title: title.into(),
            data,
            encoding: Encoding {
                x: x.to_string(),
                y: y.to_string(),
                color: None,
            },
        }
    }

    pub fn color_by(mut self, column: &str) -> Self {
        self.encoding.color = Some(column.to_string());
        self
    }
}

/// Charts laid out side by side
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRow {
    pub charts: Vec<ChartDescriptor>,
}

// =============================================================================
// Region outputs
// =============================================================================

/// Identifies what a dispatch rule writes: a region (or control) and one of its properties
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct OutputId {
    pub id: String,
    pub property: String,
}

impl OutputId {
    pub fn new(id: &str, property: &str) -> Self {
        Self {
            id: id.to_string(),
            property: property.to_string(),
        }
    }
}

impl std::fmt::Display for OutputId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.id, self.property)
    }
}

/// The new content for one output after an event
#[derive(Debug, Clone, PartialEq)]
pub enum OutputValue {
    /// Region is cleared
    Nothing,
    /// Boolean property of a control, e.g. `disabled`
    Flag(bool),
    Figure(ChartDescriptor),
    Grid(Vec<ChartRow>),
}

impl OutputValue {
    /// Every chart carried by this output, in layout order
    pub fn charts(&self) -> Vec<&ChartDescriptor> {
        match self {
            OutputValue::Figure(chart) => vec![chart],
            OutputValue::Grid(rows) => rows.iter().flat_map(|r| r.charts.iter()).collect(),
            OutputValue::Nothing | OutputValue::Flag(_) => Vec::new(),
        }
    }
}
