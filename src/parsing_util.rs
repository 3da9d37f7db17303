//! Parsing of command line codepoint lists

use crate::cmap::CodepointRange;
use crate::error::WoffError;

/// Parse a comma separated list of hexadecimal codepoints and `from-to` ranges, such as
/// `20-7e,F001-F008,E12a`. An empty string is an empty list.
pub fn parse_range_list(range_str: &str) -> Result<Vec<CodepointRange>, WoffError> {
    if range_str.trim().is_empty() {
        return Ok(Vec::new());
    }

    range_str.split(',').map(|item| parse_range(item.trim())).collect()
}

fn parse_range(item: &str) -> Result<CodepointRange, WoffError> {
    let parse_codepoint = |cp: &str| {
        u32::from_str_radix(cp.trim(), 16).map_err(|_| WoffError::InvalidRange(item.to_owned()))
    };

    let range = match item.split_once('-') {
        Some((from, to)) => CodepointRange::new(parse_codepoint(from)?, parse_codepoint(to)?),
        None => CodepointRange::single(parse_codepoint(item)?),
    };
    if range.from > range.to {
        return Err(WoffError::InvalidRange(item.to_owned()));
    }
    Ok(range)
}
