use super::{FileName, Highlight, LineWithHighlight, LinesWithHighlight, SourceMap};
use crate::{span, Spanning};

#[test]
fn spans_are_laid_out_with_padding() {
    let mut map = SourceMap::default();
    let first = map.add_str(FileName::Anonymous, "abc");
    let second = map.add_str(FileName::Anonymous, "defgh");

    assert_eq!(map[first].span(), span(1, 4));
    assert_eq!(map[second].span(), span(5, 10));
}

#[test]
fn snippet_resolves_to_the_source_text() {
    let mut map = SourceMap::default();
    map.add_str(FileName::Anonymous, "let it = be\n");

    assert_eq!(map.snippet(span(5, 7)), "it");
}

#[test]
fn lines_single_line_highlight() {
    let mut map = SourceMap::default();
    map.add_str(FileName::Anonymous, "alpha beta\ngamma\n");

    assert_eq!(
        map.lines_with_highlight(span(7, 11)),
        LinesWithHighlight {
            file: &FileName::Anonymous,
            first: LineWithHighlight {
                number: 1,
                content: "alpha beta",
                highlight: Highlight {
                    start: 7,
                    end: 11,
                    width: 4,
                    prefix_width: 6,
                },
            },
            last: None,
        },
    );
}

#[test]
fn lines_multi_line_highlight() {
    let mut map = SourceMap::default();
    map.add_str(FileName::Anonymous, "alpha beta\ngamma delta\n");

    let lines = map.lines_with_highlight(span(7, 17));

    assert_eq!(lines.first.number, 1);
    assert_eq!(lines.first.content, "alpha beta");
    assert_eq!(lines.first.highlight.start, 7);

    let last = lines.last.unwrap();
    assert_eq!(last.number, 2);
    assert_eq!(last.content, "gamma delta");
    assert_eq!(last.highlight.end, 6);
}

#[test]
fn lines_highlight_at_end_of_input() {
    let mut map = SourceMap::default();
    map.add_str(FileName::Anonymous, "alpha");

    assert_eq!(
        map.lines_with_highlight(span(6, 6)),
        LinesWithHighlight {
            file: &FileName::Anonymous,
            first: LineWithHighlight {
                number: 1,
                content: "alpha",
                highlight: Highlight {
                    start: 6,
                    end: 6,
                    width: 1,
                    prefix_width: 5,
                },
            },
            last: None,
        },
    );
}

#[test]
fn lines_highlight_wide_characters() {
    let mut map = SourceMap::default();
    map.add_str(FileName::Anonymous, "别有洞天\n");

    let lines = map.lines_with_highlight(span(1, 7));

    assert_eq!(lines.first.highlight.start, 1);
    assert_eq!(lines.first.highlight.end, 3);
    // Each of the two highlighted characters is two columns wide.
    assert_eq!(lines.first.highlight.width, 4);
}
