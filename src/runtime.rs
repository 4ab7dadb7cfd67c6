// Runtime executor for the dashboard DSL

use anyhow::Result;
use serde::Serialize;

use crate::aggregate::{self, TopN};
use crate::compiler;
use crate::data::{Table, ELECTRIC_RANGE, ELECTRIC_UTILITY, MAKE, MODEL_YEAR, VEHICLE_TYPE};
use crate::ir::ChartSpec;
use crate::parser::ast::{
    DashboardSpec, MakeSharePanel, Panel, RangePanel, TypeSharePanel, UtilityPanel,
};

/// Values a host can offer in its selection controls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Choices {
    pub makes: Vec<String>,
    /// Make the `years_for_make` list belongs to.
    pub selected_make: Option<String>,
    pub years_for_make: Vec<String>,
    pub all_years: Vec<String>,
}

/// Selectable makes and years. Without a make the first one is assumed.
pub fn choices(table: &Table, make: Option<&str>) -> Result<Choices> {
    let makes = aggregate::distinct_sorted(table, MAKE)?;
    let all_years = aggregate::distinct_sorted(table, MODEL_YEAR)?;

    let selected_make = make
        .map(str::to_string)
        .or_else(|| makes.first().cloned());

    let years_for_make = match &selected_make {
        Some(m) => aggregate::distinct_sorted(&aggregate::filter_eq(table, MAKE, m)?, MODEL_YEAR)?,
        None => Vec::new(),
    };

    Ok(Choices {
        makes,
        selected_make,
        years_for_make,
        all_years,
    })
}

/// Build every chart of a dashboard from the table and the current selections.
///
/// Pure: the same table and spec always give the same charts.
pub fn build_dashboard(spec: &DashboardSpec, table: &Table) -> Result<Vec<ChartSpec>> {
    if spec.panels.is_empty() {
        anyhow::bail!("Dashboard requires at least one panel");
    }

    spec.panels
        .iter()
        .map(|panel| build_panel(panel, table))
        .collect()
}

pub fn build_panel(panel: &Panel, table: &Table) -> Result<ChartSpec> {
    log::debug!("building panel '{}'", panel.name());
    let chart = match panel {
        Panel::TypeShare(p) => type_share(p, table)?,
        Panel::Utility(p) => utility(p, table)?,
        Panel::MakeShare(p) => make_share(p, table)?,
        Panel::Range(p) => range(p, table)?,
    };

    if chart.is_empty() {
        log::warn!("panel '{}' has no data after filtering", chart.id);
    } else {
        log::debug!("panel '{}': {} groups", chart.id, chart.data.len());
    }
    Ok(chart)
}

fn type_share(panel: &TypeSharePanel, table: &Table) -> Result<ChartSpec> {
    let counts = aggregate::value_counts(table, VEHICLE_TYPE)?;
    let title = panel
        .title
        .clone()
        .unwrap_or_else(|| "Battery Electric vs. Plug-in Hybrid Distribution".to_string());
    Ok(compiler::compile_type_share(counts, title))
}

fn utility(panel: &UtilityPanel, table: &Table) -> Result<ChartSpec> {
    let makes = aggregate::distinct_sorted(table, MAKE)?;
    let make = panel.make.clone().or_else(|| makes.first().cloned());

    let by_make = match &make {
        Some(m) => aggregate::filter_eq(table, MAKE, m)?,
        None => table.empty_like(),
    };

    let years = aggregate::distinct_sorted(&by_make, MODEL_YEAR)?;
    let year = panel.year.clone().or_else(|| years.first().cloned());

    let filtered = match &year {
        Some(y) => aggregate::filter_eq(&by_make, MODEL_YEAR, y)?,
        None => by_make.empty_like(),
    };
    log::debug!("utility: make={:?} year={:?} rows={}", make, year, filtered.len());

    let counts = aggregate::value_counts(&filtered, ELECTRIC_UTILITY)?;
    let title = panel.title.clone().unwrap_or_else(|| match (&make, &year) {
        (Some(m), Some(y)) => format!("Electric Utility Distribution for {} ({})", m, y),
        (Some(m), None) => format!("Electric Utility Distribution for {}", m),
        _ => "Electric Utility Distribution".to_string(),
    });
    Ok(compiler::compile_utility(counts, title))
}

fn make_share(panel: &MakeSharePanel, table: &Table) -> Result<ChartSpec> {
    let years = aggregate::distinct_sorted(table, MODEL_YEAR)?;
    let year = panel.year.clone().or_else(|| years.first().cloned());

    let year_rows = match &year {
        Some(y) => aggregate::filter_eq(table, MODEL_YEAR, y)?,
        None => table.empty_like(),
    };
    log::debug!("make_share: year={:?} rows={}", year, year_rows.len());

    let counts = aggregate::value_counts(&year_rows, MAKE)?;
    let title = panel.title.clone().unwrap_or_else(|| match &year {
        Some(y) => format!("Vehicle Production Distribution by Make in {}", y),
        None => "Vehicle Production Distribution by Make".to_string(),
    });
    Ok(compiler::compile_make_share(counts, title))
}

fn range(panel: &RangePanel, table: &Table) -> Result<ChartSpec> {
    let top = match panel.top {
        Some(n) => TopN::new(n)?,
        None => TopN::default(),
    };

    // Top makes are ranked on rows that have both a range and a year.
    let complete = aggregate::drop_missing(table, &[ELECTRIC_RANGE, MODEL_YEAR])?;
    let top_makes = aggregate::top_n(&complete, MAKE, top)?;
    log::debug!("range: top {} makes {:?}", top.get(), top_makes);

    let filtered = aggregate::filter_in(&complete, MAKE, &top_makes)?;
    let means = aggregate::mean_by(&filtered, &[MODEL_YEAR, MAKE], ELECTRIC_RANGE)?;

    let title = panel
        .title
        .clone()
        .unwrap_or_else(|| format!("avg electric range of top {} makes", top.get()));
    Ok(compiler::compile_range(means, title))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashboardError;
    use crate::ir::ChartKind;
    use crate::parser::parse_dashboard;

    fn make_table(headers: Vec<&str>, rows: Vec<Vec<&str>>) -> Table {
        Table::new(
            headers.into_iter().map(String::from).collect(),
            rows.into_iter()
                .map(|r| r.into_iter().map(String::from).collect())
                .collect(),
        )
    }

    const BEV: &str = "Battery Electric Vehicle (BEV)";
    const PHEV: &str = "Plug-in Hybrid Electric Vehicle (PHEV)";

    fn fleet() -> Table {
        make_table(
            vec!["Make", "Model Year", "Electric Vehicle Type", "Electric Range", "Electric Utility"],
            vec![
                vec!["TESLA", "2020", BEV, "322", "PUGET SOUND ENERGY INC"],
                vec!["TESLA", "2020", BEV, "291", "PUGET SOUND ENERGY INC"],
                vec!["TESLA", "2020", BEV, "", "CITY OF SEATTLE - (WA)"],
                vec!["TESLA", "2021", BEV, "", "PUGET SOUND ENERGY INC"],
                vec!["NISSAN", "2019", BEV, "150", "PUGET SOUND ENERGY INC"],
                vec!["NISSAN", "2020", BEV, "149", "BONNEVILLE POWER ADMINISTRATION"],
                vec!["CHEVROLET", "2020", PHEV, "53", "PUGET SOUND ENERGY INC"],
                vec!["BMW", "2021", PHEV, "30", "CITY OF SEATTLE - (WA)"],
            ],
        )
    }

    fn build(pipeline: &str, table: &Table) -> Result<Vec<ChartSpec>> {
        let (_, spec) = parse_dashboard(pipeline).unwrap();
        build_dashboard(&spec, table)
    }

    #[test]
    fn test_choices() {
        let c = choices(&fleet(), None).unwrap();
        assert_eq!(c.makes, vec!["BMW", "CHEVROLET", "NISSAN", "TESLA"]);
        assert_eq!(c.selected_make.as_deref(), Some("BMW"));
        assert_eq!(c.years_for_make, vec!["2021"]);
        assert_eq!(c.all_years, vec!["2019", "2020", "2021"]);

        let c = choices(&fleet(), Some("TESLA")).unwrap();
        assert_eq!(c.years_for_make, vec!["2020", "2021"]);
    }

    #[test]
    fn test_type_share() {
        let charts = build("type_share()", &fleet()).unwrap();
        let chart = &charts[0];
        assert_eq!(chart.kind, ChartKind::Pie);
        assert_eq!(chart.data.rows[0].key, vec![BEV]);
        assert_eq!(chart.data.rows[0].count, 6);
        assert_eq!(chart.data.rows[1].count, 2);
    }

    #[test]
    fn test_utility_selection() {
        let charts = build(r#"utility(make: "TESLA", year: 2020)"#, &fleet()).unwrap();
        let chart = &charts[0];
        assert_eq!(chart.title, "Electric Utility Distribution for TESLA (2020)");
        let keys: Vec<String> = chart.data.rows.iter().map(|r| r.label()).collect();
        assert_eq!(keys, vec!["PUGET SOUND ENERGY INC", "CITY OF SEATTLE - (WA)"]);
        assert_eq!(chart.data.rows[0].value, 2.0);
    }

    #[test]
    fn test_utility_defaults_to_first_choices() {
        let charts = build("utility()", &fleet()).unwrap();
        assert_eq!(charts[0].title, "Electric Utility Distribution for BMW (2021)");
        assert_eq!(charts[0].data.len(), 1);
    }

    #[test]
    fn test_utility_unknown_make_is_empty() {
        let charts = build(r#"utility(make: "RIVIAN")"#, &fleet()).unwrap();
        assert!(charts[0].is_empty());
        assert_eq!(charts[0].title, "Electric Utility Distribution for RIVIAN");
    }

    #[test]
    fn test_make_share() {
        let charts = build("make_share(year: 2020)", &fleet()).unwrap();
        let chart = &charts[0];
        assert_eq!(chart.title, "Vehicle Production Distribution by Make in 2020");
        let keys: Vec<String> = chart.data.rows.iter().map(|r| r.label()).collect();
        assert_eq!(keys, vec!["TESLA", "NISSAN", "CHEVROLET"]);
    }

    #[test]
    fn test_range_top_makes() {
        let charts = build("range(top: 2)", &fleet()).unwrap();
        let chart = &charts[0];
        assert_eq!(chart.title, "avg electric range of top 2 makes");
        // Complete rows: TESLA x2, NISSAN x2, CHEVROLET, BMW -> TESLA, NISSAN
        let keys: Vec<String> = chart.data.rows.iter().map(|r| r.label()).collect();
        assert_eq!(keys, vec!["2019, NISSAN", "2020, NISSAN", "2020, TESLA"]);
        assert_eq!(chart.data.rows[2].value, 306.5);
    }

    #[test]
    fn test_range_top_out_of_bounds() {
        let err = build("range(top: 11)", &fleet()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DashboardError>(),
            Some(DashboardError::TopNOutOfRange { got: 11, .. })
        ));
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let table = make_table(vec!["Make", "Model Year"], vec![vec!["TESLA", "2020"]]);
        let err = build("type_share()", &table).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DashboardError>(),
            Some(&DashboardError::MissingColumn(VEHICLE_TYPE.into()))
        );
    }

    #[test]
    fn test_empty_table_gives_empty_charts() {
        let table = fleet().empty_like();
        let (_, spec) = parse_dashboard(crate::parser::DEFAULT_PIPELINE).unwrap();
        let charts = build_dashboard(&spec, &table).unwrap();
        assert_eq!(charts.len(), 4);
        assert!(charts.iter().all(|c| c.is_empty()));
        assert_eq!(charts[1].title, "Electric Utility Distribution");
    }

    #[test]
    fn test_dashboard_is_idempotent() {
        let table = fleet();
        let first = build(crate::parser::DEFAULT_PIPELINE, &table).unwrap();
        let second = build(crate::parser::DEFAULT_PIPELINE, &table).unwrap();
        assert_eq!(first, second);
    }
}
