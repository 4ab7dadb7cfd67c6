// Panel parsers for the dashboard DSL

use super::ast::{MakeSharePanel, Panel, RangePanel, TypeSharePanel, UtilityPanel};
use super::lexer::{integer_literal, string_literal, value_literal, ws};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::map,
    multi::separated_list0,
    sequence::preceded,
    IResult,
};

/// Parse the type share pie
/// Format: type_share() or type_share(title: "...")
pub fn parse_type_share(input: &str) -> IResult<&str, Panel> {
    let (input, _) = ws(tag("type_share"))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, args) = separated_list0(
        ws(char(',')),
        map(preceded(ws(tag("title:")), ws(string_literal)), |t| ("title", t)),
    )(input)?;

    let (input, _) = ws(char(')'))(input)?;

    let mut panel = TypeSharePanel::default();
    for (key, val) in args {
        if key == "title" {
            panel.title = Some(val);
        }
    }

    Ok((input, Panel::TypeShare(panel)))
}

/// Parse the utility bar chart
/// Format: utility() or utility(make: "TESLA", year: 2020, title: "...")
pub fn parse_utility(input: &str) -> IResult<&str, Panel> {
    let (input, _) = ws(tag("utility"))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, args) = separated_list0(
        ws(char(',')),
        alt((
            map(preceded(ws(tag("make:")), ws(value_literal)), |m| ("make", m)),
            map(preceded(ws(tag("year:")), ws(value_literal)), |y| ("year", y)),
            map(preceded(ws(tag("title:")), ws(string_literal)), |t| ("title", t)),
        )),
    )(input)?;

    let (input, _) = ws(char(')'))(input)?;

    let mut panel = UtilityPanel::default();
    for (key, val) in args {
        match key {
            "make" => panel.make = Some(val),
            "year" => panel.year = Some(val),
            "title" => panel.title = Some(val),
            _ => {}
        }
    }

    Ok((input, Panel::Utility(panel)))
}

/// Parse the make share pie
/// Format: make_share() or make_share(year: 2021, title: "...")
pub fn parse_make_share(input: &str) -> IResult<&str, Panel> {
    let (input, _) = ws(tag("make_share"))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, args) = separated_list0(
        ws(char(',')),
        alt((
            map(preceded(ws(tag("year:")), ws(value_literal)), |y| ("year", y)),
            map(preceded(ws(tag("title:")), ws(string_literal)), |t| ("title", t)),
        )),
    )(input)?;

    let (input, _) = ws(char(')'))(input)?;

    let mut panel = MakeSharePanel::default();
    for (key, val) in args {
        match key {
            "year" => panel.year = Some(val),
            "title" => panel.title = Some(val),
            _ => {}
        }
    }

    Ok((input, Panel::MakeShare(panel)))
}

/// Parse the range chart of the top makes
/// Format: range() or range(top: 5, title: "...")
pub fn parse_range(input: &str) -> IResult<&str, Panel> {
    let (input, _) = ws(tag("range"))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, args) = separated_list0(
        ws(char(',')),
        alt((
            map(preceded(ws(tag("top:")), ws(integer_literal)), |n| ("top", String::new(), n)),
            map(preceded(ws(tag("title:")), ws(string_literal)), |t| ("title", t, 0)),
        )),
    )(input)?;

    let (input, _) = ws(char(')'))(input)?;

    let mut panel = RangePanel::default();
    for (key, str_val, num_val) in args {
        match key {
            "top" => panel.top = Some(num_val),
            "title" => panel.title = Some(str_val),
            _ => {}
        }
    }

    Ok((input, Panel::Range(panel)))
}

/// Parse any panel
pub fn parse_panel(input: &str) -> IResult<&str, Panel> {
    alt((parse_type_share, parse_utility, parse_make_share, parse_range))(input)
}
