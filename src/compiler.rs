use crate::aggregate::{Aggregate, COUNT};
use crate::data::{ELECTRIC_RANGE, ELECTRIC_UTILITY, MAKE, MODEL_YEAR, VEHICLE_TYPE};
use crate::ir::{AxisBinding, ChartKind, ChartSpec, ColorEncoding, Facet, FieldKind, TextInfo};
use crate::palette::{self, SET2, TABLEAU10, UTILITY_BLUE};

/// Width and height of each make panel in the range chart.
const RANGE_PANEL_SIZE: (u32, u32) = (100, 400);

/// Pie of vehicle counts per electric vehicle type
pub fn compile_type_share(data: Aggregate, title: String) -> ChartSpec {
    ChartSpec {
        id: "type_share".to_string(),
        kind: ChartKind::Pie,
        title,
        x: Some(AxisBinding::new(VEHICLE_TYPE, FieldKind::Nominal).titled("Vehicle Type")),
        y: Some(AxisBinding::new(COUNT, FieldKind::Quantitative)),
        color: ColorEncoding::Sequence {
            colors: palette::to_strings(SET2),
        },
        facet: None,
        tooltip: vec![VEHICLE_TYPE.to_string(), COUNT.to_string()],
        text_info: Some(TextInfo::Percent),
        data,
    }
}

/// Bar of vehicle counts per electric utility
pub fn compile_utility(data: Aggregate, title: String) -> ChartSpec {
    ChartSpec {
        id: "utility".to_string(),
        kind: ChartKind::Bar,
        title,
        x: Some(AxisBinding::new(ELECTRIC_UTILITY, FieldKind::Nominal)),
        y: Some(AxisBinding::new(COUNT, FieldKind::Quantitative).titled("Number of Vehicles")),
        color: ColorEncoding::Fixed {
            color: UTILITY_BLUE.to_string(),
        },
        facet: None,
        tooltip: vec![ELECTRIC_UTILITY.to_string(), COUNT.to_string()],
        text_info: None,
        data,
    }
}

/// Pie of vehicle counts per make, labelled with make and percentage
pub fn compile_make_share(data: Aggregate, title: String) -> ChartSpec {
    ChartSpec {
        id: "make_share".to_string(),
        kind: ChartKind::Pie,
        title,
        x: Some(AxisBinding::new(MAKE, FieldKind::Nominal)),
        y: Some(AxisBinding::new(COUNT, FieldKind::Quantitative)),
        color: ColorEncoding::Sequence {
            colors: palette::to_strings(SET2),
        },
        facet: None,
        // label + percent + value on hover
        tooltip: vec![MAKE.to_string(), "Percent".to_string(), COUNT.to_string()],
        text_info: Some(TextInfo::PercentLabel),
        data,
    }
}

/// Horizontal bars of mean electric range per model year, one panel per make.
///
/// `data` is keyed by (Model Year, Make).
pub fn compile_range(data: Aggregate, title: String) -> ChartSpec {
    ChartSpec {
        id: "range".to_string(),
        kind: ChartKind::GroupedBar,
        title,
        x: Some(AxisBinding::new(ELECTRIC_RANGE, FieldKind::Quantitative).titled("Avg Electric Range")),
        y: Some(AxisBinding::new(MODEL_YEAR, FieldKind::Ordinal)),
        color: ColorEncoding::Field {
            field: MAKE.to_string(),
            colors: palette::to_strings(TABLEAU10),
        },
        facet: Some(Facet {
            field: MAKE.to_string(),
            panel_width: RANGE_PANEL_SIZE.0,
            panel_height: RANGE_PANEL_SIZE.1,
        }),
        tooltip: vec![
            MODEL_YEAR.to_string(),
            MAKE.to_string(),
            ELECTRIC_RANGE.to_string(),
        ],
        text_info: None,
        data,
    }
}
