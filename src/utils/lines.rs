//! Line and field helpers shared by the text parsers.

/// Strip a trailing `\n` / `\r\n` (and nothing else) from a line.
#[must_use]
pub fn trim_newline(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

/// Split a line on tabs after removing the line terminator.
///
/// Interior and trailing empty fields are preserved, so a row with empty
/// trailing columns still lines up with its header.
#[must_use]
pub fn tab_fields(line: &str) -> Vec<&str> {
    trim_newline(line).split('\t').collect()
}

/// Return the token `from_end` positions before the end of a
/// space-delimited line (`0` is the last token).
#[must_use]
pub fn token_from_end(line: &str, from_end: usize) -> Option<&str> {
    let tokens: Vec<&str> = trim_newline(line).split(' ').collect();
    tokens
        .len()
        .checked_sub(from_end + 1)
        .and_then(|idx| tokens.get(idx).copied())
}
