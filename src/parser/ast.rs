// Abstract Syntax Tree for the dashboard DSL

/// A dashboard: the panels to build, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSpec {
    pub panels: Vec<Panel>,
}

/// One chart of the dashboard with its selections.
///
/// `None` selections fall back to the first available choice.
#[derive(Debug, Clone, PartialEq)]
pub enum Panel {
    /// Battery electric vs. plug-in hybrid share
    TypeShare(TypeSharePanel),
    /// Vehicles per electric utility for one make and year
    Utility(UtilityPanel),
    /// Share of each make within one model year
    MakeShare(MakeSharePanel),
    /// Mean electric range per year of the top-N makes
    Range(RangePanel),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeSharePanel {
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UtilityPanel {
    pub make: Option<String>,
    pub year: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MakeSharePanel {
    pub year: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RangePanel {
    /// Checked against the allowed range at run time.
    pub top: Option<usize>,
    pub title: Option<String>,
}

impl Panel {
    /// DSL name of the panel.
    pub fn name(&self) -> &'static str {
        match self {
            Panel::TypeShare(_) => "type_share",
            Panel::Utility(_) => "utility",
            Panel::MakeShare(_) => "make_share",
            Panel::Range(_) => "range",
        }
    }
}
