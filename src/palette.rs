use plotters::style::RGBColor;

/// Qualitative Set2 (ColorBrewer), used for pie slices.
pub const SET2: &[&str] = &[
    "#66c2a5", "#fc8d62", "#8da0cb", "#e78ac3", "#a6d854", "#ffd92f", "#e5c494", "#b3b3b3",
];

/// Tableau 10, used to color makes in the range chart.
pub const TABLEAU10: &[&str] = &[
    "#4c78a8", "#f58518", "#e45756", "#72b7b2", "#54a24b", "#eeca3b", "#b279a2", "#ff9da6",
    "#9d755d", "#bab0ac",
];

/// Bar color of the utility chart.
pub const UTILITY_BLUE: &str = "#0077cc";

const FALLBACK: RGBColor = RGBColor(0, 0, 255);

pub fn to_strings(colors: &[&str]) -> Vec<String> {
    colors.iter().map(|c| c.to_string()).collect()
}

/// Parse a color string, supporting hex (#RRGGBB, #RGB) and named colors
pub fn parse_color(color_str: &str) -> Option<RGBColor> {
    let color_str = color_str.trim();

    if let Some(hex) = color_str.strip_prefix('#') {
        return parse_hex_color(hex);
    }

    match color_str.to_lowercase().as_str() {
        "white" => Some(RGBColor(255, 255, 255)),
        "black" => Some(RGBColor(0, 0, 0)),
        "red" => Some(RGBColor(255, 0, 0)),
        "green" => Some(RGBColor(0, 128, 0)),
        "blue" => Some(RGBColor(0, 0, 255)),
        "orange" => Some(RGBColor(255, 165, 0)),
        "purple" => Some(RGBColor(128, 0, 128)),
        "gray" | "grey" => Some(RGBColor(128, 128, 128)),
        "lightgray" | "lightgrey" => Some(RGBColor(192, 192, 192)),
        _ => None,
    }
}

fn parse_hex_color(hex: &str) -> Option<RGBColor> {
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(RGBColor(r, g, b))
        }
        3 => {
            let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
            Some(RGBColor(r, g, b))
        }
        _ => None,
    }
}

/// `n` colors taken from `colors` in order, wrapping around.
///
/// Unparseable entries fall back to blue; an empty list gives all blue.
pub fn cycle(colors: &[String], n: usize) -> Vec<RGBColor> {
    if colors.is_empty() {
        return vec![FALLBACK; n];
    }
    (0..n)
        .map(|i| parse_color(&colors[i % colors.len()]).unwrap_or(FALLBACK))
        .collect()
}

pub fn resolve(color: &str) -> RGBColor {
    parse_color(color).unwrap_or(FALLBACK)
}
