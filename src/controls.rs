use crate::error::{DashError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Current value of a control as sent by the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlValue {
    /// No selection (`null` on the wire)
    Empty,
    Int(i64),
    Text(String),
    Range(f64, f64),
}

impl ControlValue {
    pub fn text(s: &str) -> Self {
        ControlValue::Text(s.to_string())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ControlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ControlValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_range(&self) -> Option<(f64, f64)> {
        match self {
            ControlValue::Range(lo, hi) => Some((*lo, *hi)),
            _ => None,
        }
    }
}

impl fmt::Display for ControlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlValue::Empty => write!(f, "null"),
            ControlValue::Int(v) => write!(f, "{}", v),
            ControlValue::Text(s) => write!(f, "{:?}", s),
            ControlValue::Range(lo, hi) => write!(f, "[{}, {}]", lo, hi),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropdownOption {
    pub label: String,
    pub value: ControlValue,
}

impl DropdownOption {
    pub fn new(label: impl Into<String>, value: ControlValue) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ControlKind {
    Dropdown {
        options: Vec<DropdownOption>,
        placeholder: Option<String>,
        searchable: bool,
        clearable: bool,
    },
    RangeSlider {
        min: f64,
        max: f64,
        step: f64,
        /// (position, label) ticks shown under the slider
        marks: Vec<(f64, String)>,
    },
}

/// A user-facing input widget
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Control {
    pub id: String,
    pub kind: ControlKind,
    pub default: ControlValue,
}

impl Control {
    pub fn dropdown(id: &str, options: Vec<DropdownOption>, default: ControlValue) -> Self {
        Self {
            id: id.to_string(),
            kind: ControlKind::Dropdown {
                options,
                placeholder: None,
                searchable: false,
                clearable: true,
            },
            default,
        }
    }

    pub fn range_slider(id: &str, min: f64, max: f64, step: f64, marks: Vec<(f64, String)>) -> Self {
        Self {
            id: id.to_string(),
            kind: ControlKind::RangeSlider {
                min,
                max,
                step,
                marks,
            },
            default: ControlValue::Range(min, max),
        }
    }

    pub fn placeholder(mut self, text: &str) -> Self {
        if let ControlKind::Dropdown { placeholder, .. } = &mut self.kind {
            *placeholder = Some(text.to_string());
        }
        self
    }

    pub fn searchable(mut self, value: bool) -> Self {
        if let ControlKind::Dropdown { searchable, .. } = &mut self.kind {
            *searchable = value;
        }
        self
    }

    pub fn clearable(mut self, value: bool) -> Self {
        if let ControlKind::Dropdown { clearable, .. } = &mut self.kind {
            *clearable = value;
        }
        self
    }

    /// Whether `value` is one this control can actually take
    pub fn admits(&self, value: &ControlValue) -> bool {
        match (&self.kind, value) {
            (ControlKind::Dropdown { clearable, .. }, ControlValue::Empty) => *clearable,
            (ControlKind::Dropdown { options, .. }, v) => options.iter().any(|o| &o.value == v),
            (ControlKind::RangeSlider { min, max, .. }, ControlValue::Range(lo, hi)) => {
                min <= lo && lo <= hi && hi <= max
            }
            (ControlKind::RangeSlider { .. }, _) => false,
        }
    }
}

/// Declared controls, in layout order
#[derive(Debug, Clone, Default)]
pub struct ControlRegistry {
    controls: Vec<Control>,
}

impl ControlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, control: Control) -> Result<()> {
        if self.contains(&control.id) {
            return Err(DashError::DuplicateControl(control.id));
        }
        self.controls.push(control);
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.controls.iter().any(|c| c.id == id)
    }

    pub fn get(&self, id: &str) -> Result<&Control> {
        self.controls
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| DashError::UndeclaredControl(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Control> {
        self.controls.iter()
    }

    /// Reject values the named control cannot take
    pub fn validate(&self, id: &str, value: &ControlValue) -> Result<()> {
        let control = self.get(id)?;
        if control.admits(value) {
            Ok(())
        } else {
            Err(DashError::InadmissibleValue {
                control: id.to_string(),
                value: value.to_string(),
            })
        }
    }
}
