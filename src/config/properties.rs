//! Producer properties files in the Java properties format.

use super::ConfigError;
use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;

/// Parse properties text into ordered `(key, value)` pairs.
///
/// Follows the Java properties format:
/// - blank lines and lines starting with `#` or `!` are skipped;
/// - a line ending in an odd number of backslashes continues on the next
///   line, whose leading whitespace is dropped;
/// - the key ends at the first unescaped `=`, `:` or whitespace, and the
///   separator may be surrounded by whitespace;
/// - `\t`, `\n`, `\r`, `\f` and `\uXXXX` are unescaped, and any other escaped
///   character stands for itself.
///
/// Trailing whitespace is trimmed from values. A later entry for the same key
/// wins when applied in order. Errors carry the line the entry starts on.
pub fn parse_properties(content: &str) -> Result<Vec<(String, String)>, (usize, String)> {
    let mut entries = Vec::new();
    let mut lines = content.lines().enumerate();
    while let Some((index, raw)) = lines.next() {
        let first = raw.trim_start();
        if first.is_empty() || first.starts_with('#') || first.starts_with('!') {
            continue;
        }

        let mut logical = first.to_string();
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some((_, next)) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        let (key, value) = split_entry(&logical).map_err(|reason| (index + 1, reason))?;
        if key.is_empty() {
            return Err((index + 1, "empty key".to_string()));
        }
        entries.push((key, value));
    }
    Ok(entries)
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn split_entry(line: &str) -> Result<(String, String), String> {
    let mut chars = line.chars().peekable();

    let mut key = String::new();
    loop {
        match chars.peek() {
            None => break,
            Some(&c) if c == '=' || c == ':' || c.is_whitespace() => break,
            Some(&'\\') => {
                chars.next();
                key.push(unescape(&mut chars)?);
            }
            Some(&c) => {
                key.push(c);
                chars.next();
            }
        }
    }

    while chars.next_if(|c| c.is_whitespace()).is_some() {}
    if chars.next_if(|&c| c == '=' || c == ':').is_some() {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
    }

    let mut value = String::new();
    while let Some(c) = chars.next() {
        if c == '\\' {
            value.push(unescape(&mut chars)?);
        } else {
            value.push(c);
        }
    }
    Ok((key, value.trim_end().to_string()))
}

fn unescape(chars: &mut Peekable<Chars<'_>>) -> Result<char, String> {
    match chars.next() {
        Some('t') => Ok('\t'),
        Some('n') => Ok('\n'),
        Some('r') => Ok('\r'),
        Some('f') => Ok('\u{c}'),
        Some('u') => {
            let hex: String = chars.by_ref().take(4).collect();
            u32::from_str_radix(&hex, 16)
                .ok()
                .filter(|_| hex.len() == 4)
                .and_then(char::from_u32)
                .ok_or_else(|| format!("malformed unicode escape '{hex}'"))
        }
        Some(other) => Ok(other),
        None => Err("dangling backslash".to_string()),
    }
}

/// Read and parse a properties file.
pub fn load_properties(path: &Path) -> Result<Vec<(String, String)>, ConfigError> {
    let content =
        std::fs::read_to_string(path).map_err(|source| ConfigError::PropertiesRead {
            path: path.to_path_buf(),
            source,
        })?;
    parse_properties(&content).map_err(|(line, reason)| ConfigError::Properties {
        path: path.to_path_buf(),
        line,
        reason,
    })
}
