// Pipeline parser for the dashboard DSL

use super::ast::DashboardSpec;
use super::lexer::ws;
use super::panel::parse_panel;
use nom::{
    bytes::complete::tag,
    combinator::{eof, opt},
    multi::separated_list1,
    IResult,
};

/// Panels built when no pipeline is given.
pub const DEFAULT_PIPELINE: &str = "type_share() | utility() | make_share() | range(top: 5)";

/// Parse a complete dashboard specification
/// Format: panel | panel | ...
pub fn parse_dashboard(input: &str) -> IResult<&str, DashboardSpec> {
    // Optional leading "|"
    let (input, _) = opt(ws(tag("|")))(input)?;

    let (input, panels) = separated_list1(ws(tag("|")), parse_panel)(input)?;

    let (input, _) = ws(eof)(input)?;

    Ok((input, DashboardSpec { panels }))
}
