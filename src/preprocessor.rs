use anyhow::Result;
use std::collections::HashMap;

use crate::error::DashboardError;

/// Substitute `$name` and `${name}` in a pipeline before parsing.
///
/// A `$` not followed by a name is kept as is. Unknown names are an error.
pub fn expand_variables(input: &str, variables: &HashMap<String, String>) -> Result<String> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        output.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let (name, consumed) = match after.strip_prefix('{') {
            Some(braced) => match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => ("", 0),
            },
            None => {
                let len = identifier_len(after);
                (&after[..len], len)
            }
        };

        if name.is_empty() {
            output.push('$');
            rest = after;
            continue;
        }

        let value = variables
            .get(name)
            .ok_or_else(|| DashboardError::UndefinedVariable(name.to_string()))?;
        output.push_str(value);
        rest = &after[consumed..];
    }

    output.push_str(rest);
    Ok(output)
}

/// Byte length of the identifier at the start of `s`.
fn identifier_len(s: &str) -> usize {
    let mut chars = s.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_alphabetic() || c == '_' => {}
        _ => return 0,
    }
    chars
        .find(|&(_, c)| !(c.is_alphanumeric() || c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Parse a `name=value` definition from the command line.
pub fn parse_definition(def: &str) -> Result<(String, String), String> {
    let (name, value) = def
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", def))?;
    let name = name.trim();
    if name.is_empty() || identifier_len(name) != name.len() {
        return Err(format!("invalid variable name '{}'", name));
    }
    Ok((name.to_string(), value.to_string()))
}
