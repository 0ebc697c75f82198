//! /etc/os-release parsing

use std::collections::HashMap;

/// Parse /etc/os-release content into key/value pairs
///
/// Surrounding single or double quotes are stripped from values; lines
/// without `=` are skipped.
pub fn parse_os_release(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim_matches(|c| c == '"' || c == '\'');
            (key.to_string(), value.to_string())
        })
        .collect()
}
