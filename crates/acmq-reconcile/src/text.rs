//! Line-level helpers shared by the three reconcilers.
//!
//! Artifacts are held as borrowed lines (line endings kept). Reconcilers record
//! insertions and single-line replacements in a `TextPatch` keyed by line index and
//! apply it in one pass, so every line the patch does not name is copied verbatim.

use std::collections::BTreeMap;

pub(crate) const TAB_WIDTH: usize = 4;

pub(crate) struct SourceLines<'a> {
    raw: Vec<&'a str>,
    newline: &'static str,
}

impl<'a> SourceLines<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self {
            raw: text.split_inclusive('\n').collect(),
            newline: if text.contains("\r\n") { "\r\n" } else { "\n" },
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.raw.len()
    }

    /// Line content without its terminator.
    pub(crate) fn get(&self, idx: usize) -> &'a str {
        strip_eol(self.raw[idx])
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (usize, &'a str)> + '_ {
        self.raw.iter().map(|l| strip_eol(l)).enumerate()
    }

    pub(crate) fn newline(&self) -> &'static str {
        self.newline
    }
}

fn strip_eol(line: &str) -> &str {
    line.strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or(line)
}

fn eol(line: &str) -> &str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}

#[derive(Debug, Default)]
pub(crate) struct TextPatch {
    before: BTreeMap<usize, Vec<String>>,
    replace: BTreeMap<usize, String>,
    append: Vec<String>,
}

impl TextPatch {
    /// Insert `lines` before line `idx`. `idx == len` inserts after the last line.
    pub(crate) fn insert_before(&mut self, idx: usize, lines: impl IntoIterator<Item = String>) {
        self.before.entry(idx).or_default().extend(lines);
    }

    pub(crate) fn insert_after(&mut self, idx: usize, lines: impl IntoIterator<Item = String>) {
        self.insert_before(idx + 1, lines);
    }

    /// Replace the content of line `idx`, keeping its line terminator.
    pub(crate) fn replace(&mut self, idx: usize, content: String) {
        self.replace.insert(idx, content);
    }

    /// Append `lines` at end of file.
    pub(crate) fn append(&mut self, lines: impl IntoIterator<Item = String>) {
        self.append.extend(lines);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.before.values().all(Vec::is_empty) && self.replace.is_empty() && self.append.is_empty()
    }

    pub(crate) fn apply(&self, src: &SourceLines<'_>) -> String {
        let nl = src.newline();
        let mut out = String::new();

        for (idx, raw) in src.raw.iter().enumerate() {
            if let Some(lines) = self.before.get(&idx) {
                push_lines(&mut out, lines, nl);
            }
            match self.replace.get(&idx) {
                Some(content) => {
                    out.push_str(content);
                    out.push_str(eol(raw));
                }
                None => out.push_str(raw),
            }
        }
        // Anything keyed at or past the end lands after the last line.
        for (_, lines) in self.before.range(src.len()..) {
            push_lines(&mut out, lines, nl);
        }
        push_lines(&mut out, &self.append, nl);
        out
    }
}

fn push_lines(out: &mut String, lines: &[String], nl: &str) {
    for l in lines {
        if !out.is_empty() && !out.ends_with('\n') {
            out.push_str(nl);
        }
        out.push_str(l);
        out.push_str(nl);
    }
}

pub(crate) fn leading_ws(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

/// Display width with tabs expanded to the next multiple of `TAB_WIDTH`.
pub(crate) fn visual_width(s: &str) -> usize {
    s.chars().fold(0, |col, c| {
        if c == '\t' {
            (col / TAB_WIDTH + 1) * TAB_WIDTH
        } else {
            col + 1
        }
    })
}

/// Byte range of the value of `name="..."` inside `line`.
fn attr_span(line: &str, name: &str) -> Option<(usize, usize)> {
    let needle = format!("{name}=\"");
    let mut from = 0;
    while let Some(pos) = line[from..].find(&needle) {
        let at = from + pos;
        let boundary = line[..at]
            .chars()
            .next_back()
            .map(|c| c.is_whitespace() || c == '<')
            .unwrap_or(true);
        let start = at + needle.len();
        if boundary {
            let end = start + line[start..].find('"')?;
            return Some((start, end));
        }
        from = start;
    }
    None
}

pub(crate) fn attr<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    attr_span(line, name).map(|(s, e)| &line[s..e])
}

pub(crate) fn with_attr(line: &str, name: &str, value: &str) -> Option<String> {
    let (s, e) = attr_span(line, name)?;
    Some(format!("{}{}{}", &line[..s], value, &line[e..]))
}

/// Strip one layer of matching single or double quotes.
pub(crate) fn unquote(raw: &str) -> (&str, Option<char>) {
    let t = raw.trim();
    for q in ['\'', '"'] {
        if t.len() >= 2 && t.starts_with(q) && t.ends_with(q) {
            return (&t[1..t.len() - 1], Some(q));
        }
    }
    (t, None)
}

pub(crate) fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
