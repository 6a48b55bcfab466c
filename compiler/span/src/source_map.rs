//! The source file registry.

use super::{ByteIndex, LocalByteIndex, LocalSpan, Span, Spanning};
use std::{fmt, ops::Range, path::PathBuf, sync::Arc};
use unicode_width::UnicodeWidthStr;
use utility::obtain;

#[cfg(test)]
mod test;

/// A mapping from [index](SourceFileIndex) to [source file](SourceFile).
///
/// The source files are laid out next to each other and padded on their left (at their start)
/// by one byte to reserve space for _end of input_ pseudo tokens.
/// Additionally, this frees up the byte index `0` and allows `Span::default()`
/// – starting at this unmapped index and empty – to be interpreted as an _unknown location_.
#[derive(Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    fn next_offset(&self) -> ByteIndex {
        const PADDING: u32 = 1;

        self.files
            .last()
            .map(|file| file.span().end)
            .unwrap_or_default()
            .advance(PADDING)
    }

    /// Add text to the map creating a [`SourceFile`] in the process.
    pub fn add(&mut self, name: impl Into<FileName>, source: Arc<String>) -> SourceFileIndex {
        let index = SourceFileIndex(self.files.len());
        self.files
            .push(SourceFile::new(name, source, self.next_offset()));
        index
    }

    pub fn add_str(&mut self, name: impl Into<FileName>, source: &str) -> SourceFileIndex {
        self.add(name, Arc::new(source.to_owned()))
    }

    pub fn file(&self, span: Span) -> &SourceFile {
        debug_assert!(span != Span::default());

        self.files
            .iter()
            .find(|file| file.span().contains(span.start) || file.span().end == span.start)
            .unwrap()
    }

    /// Resolve a span to the string content it points to.
    ///
    /// This treats line breaks verbatim.
    pub fn snippet(&self, span: Span) -> &str {
        let file = self.file(span);
        let span = span.local(file);
        &file[span]
    }

    /// Resolve a span to line/column information for rendering.
    ///
    /// Line numbers and columns are one-indexed, columns count characters.
    pub fn lines_with_highlight(&self, span: Span) -> LinesWithHighlight<'_> {
        let file = self.file(span);
        let local = span.local(file);

        let first = resolve_line(file, local.start, local);
        let last_candidate = resolve_line(file, local.end, local);
        let last = (last_candidate.number != first.number).then_some(last_candidate);

        LinesWithHighlight {
            file: &file.name,
            first,
            last,
        }
    }
}

/// Resolve the line around the given index together with the part of the
/// highlight that intersects it.
fn resolve_line(file: &SourceFile, index: LocalByteIndex, highlight: LocalSpan) -> LineWithHighlight<'_> {
    let content = file.content();
    let position: usize = index.into();

    let mut number = 1;
    let mut line_start = 0usize;

    for (offset, character) in content.char_indices() {
        if offset >= position {
            break;
        }
        if character == '\n' {
            number += 1;
            line_start = offset + character.len_utf8();
        }
    }

    let line_end = content[line_start..]
        .find('\n')
        .map_or(content.len(), |offset| line_start + offset);

    let highlight_start = usize::from(highlight.start).clamp(line_start, line_end);
    let highlight_end = usize::from(highlight.end).clamp(highlight_start, line_end);

    let prefix = &content[line_start..highlight_start];
    let highlighted = &content[highlight_start..highlight_end];

    let start = prefix.chars().count() + 1;
    let end = start + highlighted.chars().count();

    LineWithHighlight {
        number,
        content: &content[line_start..line_end],
        highlight: Highlight {
            start: start.try_into().unwrap(),
            end: end.try_into().unwrap(),
            // A line break or the end of input has no width of its own but we still
            // want to be able to point at it.
            width: if highlighted.is_empty() { 1 } else { highlighted.width() },
            prefix_width: prefix.width(),
        },
    }
}

impl std::ops::Index<SourceFileIndex> for SourceMap {
    type Output = SourceFile;

    fn index(&self, index: SourceFileIndex) -> &Self::Output {
        &self.files[index.0]
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SourceFileIndex(usize);

#[derive(Debug)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub struct LinesWithHighlight<'a> {
    pub file: &'a FileName,
    pub first: LineWithHighlight<'a>,
    /// This is `None` if the last is the first line.
    pub last: Option<LineWithHighlight<'a>>,
}

#[derive(Debug)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub struct LineWithHighlight<'a> {
    /// One-indexed line number.
    pub number: u32,
    /// The content of the entire line that contains the to-be-highlighted snippet.
    ///
    /// It may contain the whole snippet or only the starting or the ending part of it
    /// if the snippet spans multiple lines.
    pub content: &'a str,
    pub highlight: Highlight,
}

#[derive(Debug)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub struct Highlight {
    /// One-indexed column of the first highlighted character.
    pub start: u32,
    /// One-indexed column one past the last highlighted character.
    pub end: u32,
    pub width: usize,
    pub prefix_width: usize,
}

/// A source file.
///
/// Obtained by and contained within a [source map](SourceMap).
#[cfg_attr(test, derive(PartialEq, Eq))]
pub struct SourceFile {
    name: FileName,
    content: Arc<String>,
    span: Span,
}

impl SourceFile {
    /// Create a new source file.
    ///
    /// The [byte index](ByteIndex) `start` locates the file in a [source map](SourceMap).
    fn new(name: impl Into<FileName>, content: Arc<String>, start: ByteIndex) -> Self {
        Self {
            span: Span::with_length(start, content.len().try_into().unwrap()),
            name: name.into(),
            content,
        }
    }

    pub fn name(&self) -> &FileName {
        &self.name
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn local_span(&self) -> LocalSpan {
        self.span.local(self)
    }
}

impl Spanning for SourceFile {
    fn span(&self) -> Span {
        self.span
    }
}

impl std::ops::Index<LocalSpan> for SourceFile {
    type Output = str;

    fn index(&self, index: LocalSpan) -> &Self::Output {
        &self.content[Range::from(index)]
    }
}

#[derive(PartialEq, Eq, Debug)]
pub enum FileName {
    Anonymous,
    Stdin,
    Path(PathBuf),
    Virtual(&'static str),
}

impl FileName {
    pub fn path(&self) -> Option<&std::path::Path> {
        obtain!(self, Self::Path(path) => path.as_path())
    }
}

impl From<PathBuf> for FileName {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&'static str> for FileName {
    fn from(name: &'static str) -> Self {
        Self::Virtual(name)
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("⟨anonymous⟩"),
            Self::Stdin => f.write_str("⟨stdin⟩"),
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Virtual(name) => f.write_str(name),
        }
    }
}
