//! Flat `key=value` properties format.
//!
//! Follows the classic `.properties` layout:
//! - `#` and `!` start comment lines, blank lines are skipped
//! - keys end at the first unescaped `=`, `:` or whitespace
//! - a trailing odd run of backslashes continues the logical line
//! - `\t`, `\n`, `\r`, `\f`, `\uXXXX` and `\<char>` escapes are decoded
//!
//! Later duplicates of a key replace earlier ones.

use crate::error::{PropertyError, PropertyResult};
use std::collections::BTreeMap;
use std::io::Read;

/// Parsed properties, ordered by key.
pub type PropertyMap = BTreeMap<String, String>;

/// Parse properties from a string.
pub fn parse_properties(input: &str) -> PropertyResult<PropertyMap> {
    let mut map = PropertyMap::new();
    for (line_no, logical) in logical_lines(input) {
        let (raw_key, raw_value) = split_key_value(&logical);
        let key = unescape(raw_key).map_err(|reason| {
            PropertyError::malformed(format!("line {}", line_no), reason)
        })?;
        let value = unescape(raw_value).map_err(|reason| {
            PropertyError::malformed(format!("line {}", line_no), reason)
        })?;
        map.insert(key, value);
    }
    Ok(map)
}

/// Read and parse properties from any byte source.
///
/// Input is read as UTF-8 when valid, otherwise as ISO-8859-1.
pub fn load_properties(mut reader: impl Read) -> std::io::Result<PropertyResult<PropertyMap>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => e.into_bytes().iter().map(|&b| char::from(b)).collect(),
    };
    Ok(parse_properties(&text))
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\u{000C}')
}

/// Join continued physical lines into logical lines, dropping comments and blanks.
///
/// Each logical line is paired with the 1-based number of its first physical line.
fn logical_lines(input: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut current: Option<(usize, String)> = None;

    for (idx, physical) in input.lines().enumerate() {
        let physical = physical.strip_suffix('\r').unwrap_or(physical);
        let trimmed = physical.trim_start_matches(is_blank);

        if current.is_none()
            && (trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!'))
        {
            continue;
        }

        let trailing = trimmed.chars().rev().take_while(|&c| c == '\\').count();
        let continues = trailing % 2 == 1;
        let content = if continues {
            &trimmed[..trimmed.len() - 1]
        } else {
            trimmed
        };

        let (start, mut text) = current.take().unwrap_or((idx + 1, String::new()));
        text.push_str(content);

        if continues {
            current = Some((start, text));
        } else {
            lines.push((start, text));
        }
    }

    // Continuation on the final line
    if let Some(pending) = current {
        lines.push(pending);
    }

    lines
}

/// Split a logical line into raw (still escaped) key and value.
fn split_key_value(line: &str) -> (&str, &str) {
    let mut chars = line.char_indices();
    let mut key_end = line.len();
    let mut value_start = line.len();

    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '=' | ':' => {
                key_end = i;
                value_start = i + 1;
                break;
            }
            c if is_blank(c) => {
                key_end = i;
                // Whitespace may be followed by one explicit separator.
                let rest = line[i..].trim_start_matches(is_blank);
                let offset = line.len() - rest.len();
                value_start = match rest.chars().next() {
                    Some('=') | Some(':') => offset + 1,
                    _ => offset,
                };
                break;
            }
            _ => {}
        }
    }

    let value = line[value_start.min(line.len())..].trim_start_matches(is_blank);
    (&line[..key_end], value)
}

fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{000C}'),
            Some('u') => {
                let code = read_hex4(&mut chars)?;
                let decoded = if (0xD800..0xDC00).contains(&code) {
                    // High surrogate: must pair with an escaped low surrogate.
                    let low = match (chars.next(), chars.next()) {
                        (Some('\\'), Some('u')) => read_hex4(&mut chars)?,
                        _ => return Err(format!("Unpaired surrogate: \\u{:04X}", code)),
                    };
                    if !(0xDC00..0xE000).contains(&low) {
                        return Err(format!("Unpaired surrogate: \\u{:04X}", code));
                    }
                    0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00)
                } else {
                    code
                };
                let decoded = char::from_u32(decoded)
                    .ok_or_else(|| format!("Invalid code point: \\u{:04X}", code))?;
                out.push(decoded);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}

fn read_hex4(chars: &mut std::str::Chars<'_>) -> Result<u32, String> {
    let hex: String = chars.by_ref().take(4).collect();
    if hex.len() != 4 {
        return Err(format!("Malformed \\uxxxx encoding: \\u{}", hex));
    }
    u32::from_str_radix(&hex, 16).map_err(|_| format!("Malformed \\uxxxx encoding: \\u{}", hex))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_pairs_and_separators() {
        let map = parse_properties("a=1\nb: 2\nc 3\nd = 4\n").unwrap();
        assert_eq!(map.get("a").map(String::as_str), Some("1"));
        assert_eq!(map.get("b").map(String::as_str), Some("2"));
        assert_eq!(map.get("c").map(String::as_str), Some("3"));
        assert_eq!(map.get("d").map(String::as_str), Some("4"));
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let map = parse_properties("# comment\n\n   ! also comment\nkey=value\n").unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["key"], "value");
    }

    #[test]
    fn test_empty_values_are_kept() {
        let map = parse_properties("empty=\nbare\nspaced =   \n").unwrap();
        assert_eq!(map["empty"], "");
        assert_eq!(map["bare"], "");
        assert_eq!(map["spaced"], "");
    }

    #[test]
    fn test_line_continuation() {
        let map = parse_properties("fruits=apple, \\\n    banana, \\\n    pear\nnext=1\n").unwrap();
        assert_eq!(map["fruits"], "apple, banana, pear");
        assert_eq!(map["next"], "1");
    }

    #[test]
    fn test_even_backslashes_do_not_continue() {
        let map = parse_properties("path=C:\\\\\nother=x\n").unwrap();
        assert_eq!(map["path"], "C:\\");
        assert_eq!(map["other"], "x");
    }

    #[test]
    fn test_escapes_in_keys_and_values() {
        let map = parse_properties("key\\=with\\:sep=tab\\there\nuni=\\u0041\\u00e9\n").unwrap();
        assert_eq!(map["key=with:sep"], "tab\there");
        assert_eq!(map["uni"], "Aé");
    }

    #[test]
    fn test_value_keeps_inner_and_trailing_separators() {
        let map = parse_properties("url=jdbc:h2:mem:test=1\n").unwrap();
        assert_eq!(map["url"], "jdbc:h2:mem:test=1");
    }

    #[test]
    fn test_last_duplicate_wins() {
        let map = parse_properties("a=1\na=2\n").unwrap();
        assert_eq!(map["a"], "2");
    }

    #[test]
    fn test_crlf_line_endings() {
        let map = parse_properties("a=1\r\nb=2\r\n").unwrap();
        assert_eq!(map["a"], "1");
        assert_eq!(map["b"], "2");
    }

    #[test]
    fn test_malformed_unicode_escape() {
        let err = parse_properties("ok=1\nbad=\\u12\n").unwrap_err();
        match err {
            PropertyError::MalformedSource { location, .. } => assert_eq!(location, "line 2"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_load_from_reader() {
        let map = load_properties("x=y\n".as_bytes()).unwrap().unwrap();
        assert_eq!(map["x"], "y");
    }

    #[test]
    fn test_load_falls_back_to_latin1() {
        // "café=1" encoded as ISO-8859-1
        let map = load_properties(&[b'c', b'a', b'f', 0xe9, b'=', b'1', b'\n'][..])
            .unwrap()
            .unwrap();
        assert_eq!(map["café"], "1");
    }

    #[test]
    fn test_load_prefers_utf8() {
        let map = load_properties("café=1\n".as_bytes()).unwrap().unwrap();
        assert_eq!(map["café"], "1");
    }

    #[test]
    fn test_surrogate_pair_escape() {
        let map = parse_properties("ok=1\nemoji=\\uD83D\\uDE00\n").unwrap();
        assert_eq!(map["emoji"], "\u{1F600}");
        assert_eq!(map["ok"], "1");
    }

    #[test]
    fn test_unpaired_surrogate_is_malformed() {
        for input in ["a=\\uD83D\n", "a=\\uD83Dx\n", "a=\\uD83D\\u0041\n", "a=\\uDE00\n"] {
            let err = parse_properties(input).unwrap_err();
            assert!(matches!(err, PropertyError::MalformedSource { .. }), "{input:?}");
        }
    }
}
