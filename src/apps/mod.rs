//! The two dashboards and what they share: page layout and the app selector.

pub mod automobile;
pub mod launch;

use crate::data::Table;
use crate::runtime::Dispatcher;
use anyhow::Result;
use std::sync::Arc;

/// Static page structure; controls and regions are referenced by id
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    Heading(String),
    Label(String),
    Paragraph(String),
    Break,
    Control(String),
    Region(String),
}

/// A loaded dashboard: page layout plus its dispatcher
pub struct Dashboard {
    pub title: String,
    pub layout: Vec<Component>,
    pub dispatcher: Dispatcher,
}

impl Dashboard {
    /// Region ids in layout order
    pub fn regions(&self) -> Vec<&str> {
        self.layout
            .iter()
            .filter_map(|c| match c {
                Component::Region(id) => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum App {
    Automobile,
    Launch,
}

impl App {
    pub fn default_source(&self) -> &'static str {
        match self {
            App::Automobile => automobile::DEFAULT_SOURCE,
            App::Launch => launch::DEFAULT_SOURCE,
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            App::Automobile => 8050,
            App::Launch => 8051,
        }
    }

    pub fn build(&self, table: Arc<Table>) -> Result<Dashboard> {
        match self {
            App::Automobile => automobile::build(table),
            App::Launch => launch::build(table),
        }
    }
}
