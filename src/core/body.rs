use super::escape::xml_escape;

/// Line that starts an email signature. It and everything after it is dropped.
const SIGNATURE_MARKER: &str = "--";

/// Separator placed between note lines, which Tracks renders as HTML.
pub const LINE_BREAK: &str = "<br/>\n";

/// Turn a plain-text email body into a Tracks note.
///
/// Returns `None` when nothing but blank lines (or a signature) is left.
pub fn extract_note(body: &str) -> Option<String> {
    let lines: Vec<&str> = body
        .split('\n')
        .map(str::trim_end)
        .take_while(|line| *line != SIGNATURE_MARKER)
        .collect();

    let mut end = lines.len();
    while end > 0 && lines[end - 1].is_empty() {
        end -= 1;
    }

    let mut start = 0;
    while start < end && lines[start].is_empty() {
        start += 1;
    }

    if start == end {
        return None;
    }

    let escaped: Vec<String> = lines[start..end].iter().map(|l| xml_escape(l)).collect();
    Some(escaped.join(LINE_BREAK))
}
