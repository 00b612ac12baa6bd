//! JSON-line close events read from a file or stdin.

use std::io::{self, BufRead};

use confluence_core::data::{CloseEvent, DataError};

/// Parse one close event per line, skipping blank lines.
///
/// Malformed lines come through as `Err` items and reading continues. The
/// first I/O error ends the iterator and is left in `read_error`.
pub fn close_events<'a, R: BufRead + 'a>(
    reader: R,
    read_error: &'a mut Option<io::Error>,
) -> impl Iterator<Item = Result<CloseEvent, DataError>> + 'a {
    reader
        .lines()
        .map_while(move |line| match line {
            Ok(line) => Some(line),
            Err(e) => {
                *read_error = Some(e);
                None
            }
        })
        .filter(|line| !line.trim().is_empty())
        .map(|line| CloseEvent::from_json_line(&line))
}
