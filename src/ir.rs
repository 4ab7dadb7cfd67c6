use serde::Serialize;

use crate::aggregate::Aggregate;

// =============================================================================
// Chart specification
// =============================================================================

/// Declarative description of one dashboard chart.
///
/// Produced by the compiler from an [`Aggregate`]; consumed by the renderer
/// in `graph` or serialized as JSON for an external surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    /// Panel name, used for output file names.
    pub id: String,
    pub kind: ChartKind,
    pub title: String,
    /// Category axis (bar) or slice names (pie).
    pub x: Option<AxisBinding>,
    /// Value axis (bar) or slice sizes (pie).
    pub y: Option<AxisBinding>,
    pub color: ColorEncoding,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facet: Option<Facet>,
    pub tooltip: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_info: Option<TextInfo>,
    pub data: Aggregate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Pie,
    Bar,
    GroupedBar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Nominal,
    Ordinal,
    Quantitative,
}

/// Binds a data field to a position channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisBinding {
    pub field: String,
    pub title: String,
    pub kind: FieldKind,
}

impl AxisBinding {
    pub fn new(field: &str, kind: FieldKind) -> Self {
        Self {
            field: field.to_string(),
            title: field.to_string(),
            kind,
        }
    }

    pub fn titled(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColorEncoding {
    /// One color for every mark.
    Fixed { color: String },
    /// Colors assigned to marks in order, cycling.
    Sequence { colors: Vec<String> },
    /// Colors assigned per distinct value of a field, cycling.
    Field { field: String, colors: Vec<String> },
}

/// Small-multiple layout: one panel per value of `field`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Facet {
    pub field: String,
    pub panel_width: u32,
    pub panel_height: u32,
}

/// Text drawn on pie slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextInfo {
    #[serde(rename = "percent")]
    Percent,
    #[serde(rename = "percent+label")]
    PercentLabel,
}

impl ChartSpec {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Position of `field` within the aggregate's key columns.
    pub fn key_position(&self, field: &str) -> Option<usize> {
        self.data
            .key_columns
            .iter()
            .position(|k| k.eq_ignore_ascii_case(field))
    }
}
