//! Inline markdown segmentation for field values.
//!
//! Only the three styling axes are understood: bold (`**x**`), italic
//! (`*x*`), underline (`__x__`) and their combinations. Anything that does
//! not form a valid marker pair stays literal text, markers included.
//!
//! Marker pairs are matched tier by tier, most specific first, so that
//! `***x***` is bold+italic rather than bold wrapped around `*x*`. Within a
//! tier the leftmost opener wins, and ranges claimed by a tier are off
//! limits to every later tier. Segments never nest.

/// Escape character that turns a following `*` or `_` into literal text.
pub const ESCAPE: char = '\\';

/// A contiguous piece of the source text with absolute style flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormattedSegment {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl FormattedSegment {
    /// An unstyled segment.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    fn styled(text: String, style: Style) -> Self {
        Self {
            text,
            bold: style.bold,
            italic: style.italic,
            underline: style.underline,
        }
    }

    /// True when no styling axis is set.
    pub fn is_plain(&self) -> bool {
        !(self.bold || self.italic || self.underline)
    }
}

#[derive(Debug, Clone, Copy)]
struct Style {
    bold: bool,
    italic: bool,
    underline: bool,
}

impl Style {
    const fn new(bold: bool, italic: bool, underline: bool) -> Self {
        Self {
            bold,
            italic,
            underline,
        }
    }
}

/// One priority tier: the accepted `(open, close)` delimiter pairs and the
/// style they produce.
struct MarkerTier {
    delimiters: &'static [(&'static str, &'static str)],
    style: Style,
}

/// Marker tiers in priority order.
const MARKER_TIERS: [MarkerTier; 7] = [
    MarkerTier {
        delimiters: &[("***__", "__***"), ("__***", "***__")],
        style: Style::new(true, true, true),
    },
    MarkerTier {
        delimiters: &[("**__", "__**"), ("__**", "**__")],
        style: Style::new(true, false, true),
    },
    MarkerTier {
        delimiters: &[("*__", "__*"), ("__*", "*__")],
        style: Style::new(false, true, true),
    },
    MarkerTier {
        delimiters: &[("***", "***")],
        style: Style::new(true, true, false),
    },
    MarkerTier {
        delimiters: &[("**", "**")],
        style: Style::new(true, false, false),
    },
    MarkerTier {
        delimiters: &[("__", "__")],
        style: Style::new(false, false, true),
    },
    MarkerTier {
        delimiters: &[("*", "*")],
        style: Style::new(false, true, false),
    },
];

fn is_marker_char(ch: char) -> bool {
    ch == '*' || ch == '_'
}

/// A source character after escape processing.
#[derive(Debug, Clone, Copy)]
struct Cell {
    ch: char,
    escaped: bool,
}

fn to_cells(text: &str) -> Vec<Cell> {
    let mut cells = Vec::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == ESCAPE {
            if let Some(&next) = chars.peek() {
                if is_marker_char(next) {
                    chars.next();
                    cells.push(Cell {
                        ch: next,
                        escaped: true,
                    });
                    continue;
                }
            }
        }
        cells.push(Cell { ch, escaped: false });
    }

    cells
}

/// Whether the text contains any unescaped `*` or `_`.
pub fn has_markdown(text: &str) -> bool {
    if !text.contains(is_marker_char) {
        return false;
    }
    to_cells(text)
        .iter()
        .any(|c| !c.escaped && is_marker_char(c.ch))
}

/// Remove escape characters in front of `*` and `_`.
pub fn unescape(text: &str) -> String {
    to_cells(text).iter().map(|c| c.ch).collect()
}

/// Split a field value into paragraphs on embedded newlines.
///
/// A trailing `\r` is dropped from each line, so CRLF input behaves like LF.
pub fn split_paragraphs(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
}

/// Split text into an ordered, gapless list of styled segments.
///
/// Text without unescaped markers comes back as a single plain segment.
/// A matched pair with empty content (`****`) yields an empty styled
/// segment rather than being dropped.
pub fn segment(text: &str) -> Vec<FormattedSegment> {
    if !has_markdown(text) {
        return vec![FormattedSegment::plain(unescape(text))];
    }

    let mut scanner = Scanner::new(to_cells(text));
    for tier in &MARKER_TIERS {
        scanner.run_tier(tier);
    }
    scanner.into_segments()
}

/// A claimed range: opener at `start`, content, closer ending at `end`.
struct Span {
    start: usize,
    content: std::ops::Range<usize>,
    end: usize,
    style: Style,
}

struct Scanner {
    cells: Vec<Cell>,
    consumed: Vec<bool>,
    spans: Vec<Span>,
}

impl Scanner {
    fn new(cells: Vec<Cell>) -> Self {
        let consumed = vec![false; cells.len()];
        Self {
            cells,
            consumed,
            spans: Vec::new(),
        }
    }

    /// Unescaped, unclaimed marker character `ch` at `i`.
    fn is_marker(&self, i: usize, ch: char) -> bool {
        match self.cells.get(i) {
            Some(cell) => !cell.escaped && cell.ch == ch && !self.consumed[i],
            None => false,
        }
    }

    fn delimiter_at(&self, i: usize, delimiter: &str) -> bool {
        delimiter
            .chars()
            .enumerate()
            .all(|(k, ch)| self.is_marker(i + k, ch))
    }

    fn run_tier(&mut self, tier: &MarkerTier) {
        let mut i = 0;
        while i < self.cells.len() {
            let found = tier
                .delimiters
                .iter()
                .find_map(|&(open, close)| self.match_at(i, open, close));

            match found {
                Some((content, end)) => {
                    self.claim(i, content, end, tier.style);
                    i = end;
                }
                None => i += 1,
            }
        }
    }

    /// Try to match `open ... close` with the opener at `start`.
    ///
    /// The opener may not continue a run of its own marker character, and
    /// its content may neither start nor end with whitespace or with the
    /// marker character touching the delimiter. The nearest closer is the
    /// only candidate; content never spans a range claimed earlier.
    fn match_at(
        &self,
        start: usize,
        open: &str,
        close: &str,
    ) -> Option<(std::ops::Range<usize>, usize)> {
        if !self.delimiter_at(start, open) {
            return None;
        }

        let open_first = open.chars().next()?;
        let open_last = open.chars().last()?;
        let close_first = close.chars().next()?;
        let close_last = close.chars().last()?;

        if start > 0 && self.is_marker(start - 1, open_first) {
            return None;
        }

        let content_start = start + open.len();

        if open.len() >= 2 && self.delimiter_at(content_start, close) {
            let end = content_start + close.len();
            return (!self.is_marker(end, close_last)).then_some((content_start..content_start, end));
        }

        let first = self.cells.get(content_start)?;
        if first.ch.is_whitespace()
            || self.consumed[content_start]
            || self.is_marker(content_start, open_last)
        {
            return None;
        }

        for j in content_start + 1..self.cells.len() {
            if self.consumed[j] {
                return None;
            }
            if self.delimiter_at(j, close) {
                let last = self.cells[j - 1];
                if last.ch.is_whitespace() || self.is_marker(j - 1, close_first) {
                    return None;
                }
                return Some((content_start..j, j + close.len()));
            }
        }

        None
    }

    fn claim(&mut self, start: usize, content: std::ops::Range<usize>, end: usize, style: Style) {
        for flag in &mut self.consumed[start..end] {
            *flag = true;
        }
        self.spans.push(Span {
            start,
            content,
            end,
            style,
        });
    }

    fn into_segments(self) -> Vec<FormattedSegment> {
        let Scanner {
            cells, mut spans, ..
        } = self;
        spans.sort_by_key(|s| s.start);

        let mut segments = Vec::with_capacity(spans.len() * 2 + 1);
        let mut literal = String::new();
        let mut pos = 0;

        for span in spans {
            literal.extend(cells[pos..span.start].iter().map(|c| c.ch));
            if !literal.is_empty() {
                segments.push(FormattedSegment::plain(std::mem::take(&mut literal)));
            }
            let text = cells[span.content].iter().map(|c| c.ch).collect();
            segments.push(FormattedSegment::styled(text, span.style));
            pos = span.end;
        }

        literal.extend(cells[pos..].iter().map(|c| c.ch));
        if !literal.is_empty() || segments.is_empty() {
            segments.push(FormattedSegment::plain(literal));
        }

        segments
    }
}
