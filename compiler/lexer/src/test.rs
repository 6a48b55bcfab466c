use crate::{BareError, Error, Outcome};
use span::{span, FileName, SourceMap, Spanned};
use std::sync::Arc;
use token::{
    BareToken::{self, *},
    IntTy, Token,
};
use utility::difference;

fn lex(source: &'static str) -> Outcome {
    super::lex_string(source.to_owned())
}

macro_rules! assert_lex_eq {
    ($source:literal, $tokens:expr $(,)?) => {
        assert_lex_eq!($source, $tokens, Vec::new())
    };
    ($source:literal, $tokens:expr, $errors:expr $(,)?) => {
        assert_eq(
            lex($source),
            Outcome {
                tokens: $tokens,
                errors: $errors,
            },
        )
    };
}

#[track_caller]
fn assert_eq(actual: Outcome, expected: Outcome) {
    if actual != expected {
        panic!(
            "the output by the lexer does not match the expected one:\n{}",
            difference(&format!("{expected:#?}"), &format!("{actual:#?}"), "\n"),
        );
    }
}

fn int(value: i64, len: i8, signed: bool) -> BareToken {
    Int {
        value: value.into(),
        ty: IntTy { len, signed },
    }
}

#[test]
fn words_and_keywords() {
    assert_lex_eq!(
        "fn let if else while for in return true false",
        vec![
            Token::new(span(1, 3), Fn),
            Token::new(span(4, 7), Let),
            Token::new(span(8, 10), If),
            Token::new(span(11, 15), Else),
            Token::new(span(16, 21), While),
            Token::new(span(22, 25), For),
            Token::new(span(26, 28), In),
            Token::new(span(29, 35), Return),
            Token::new(span(36, 40), True),
            Token::new(span(41, 46), False),
            Token::new(span(46, 46), EndOfInput),
        ],
    );
}

#[test]
fn identifiers() {
    assert_lex_eq!(
        "alpha alpha0 _alpha al6ha_beta_",
        vec![
            Token::new(span(1, 6), Word("alpha".into())),
            Token::new(span(7, 13), Word("alpha0".into())),
            Token::new(span(14, 20), Word("_alpha".into())),
            Token::new(span(21, 32), Word("al6ha_beta_".into())),
            Token::new(span(32, 32), EndOfInput),
        ],
    );
}

#[test]
fn typenames_packnames_attributes() {
    assert_lex_eq!(
        "Array @core #inline.always",
        vec![
            Token::new(span(1, 6), Typename("Array".into())),
            Token::new(span(7, 12), Packname("core".into())),
            Token::new(span(13, 27), Attribute("inline.always".into())),
            Token::new(span(27, 27), EndOfInput),
        ],
    );
}

#[test]
fn pub_with_reach() {
    assert_lex_eq!(
        "pub pub(all) pub(open)",
        vec![
            Token::new(span(1, 4), Pub),
            Token::new(span(5, 13), Puball),
            Token::new(span(14, 23), Pubopen),
            Token::new(span(23, 23), EndOfInput),
        ],
    );
}

#[test]
fn line_comments_and_newlines() {
    assert_lex_eq!(
        "alpha // commentary ensues\nbeta\n",
        vec![
            Token::new(span(1, 6), Word("alpha".into())),
            Token::new(span(27, 28), Newline),
            Token::new(span(28, 32), Word("beta".into())),
            Token::new(span(32, 33), Newline),
            Token::new(span(33, 33), EndOfInput),
        ],
    );
}

#[test]
fn number_literals() {
    assert_lex_eq!(
        "0xFFuL 42N 7uL 1_000e3 0x1.8p2F 3.14",
        vec![
            Token::new(span(1, 7), int(255, 64, false)),
            Token::new(span(8, 11), int(42, -1, true)),
            Token::new(span(12, 15), int(7, 64, false)),
            Token::new(span(16, 23), Double(1e6)),
            Token::new(span(24, 32), FloatLit(6.0)),
            Token::new(span(33, 37), Double(3.14)),
            Token::new(span(37, 37), EndOfInput),
        ],
    );
}

#[test]
fn number_literal_bases() {
    assert_lex_eq!(
        "0b1011 0o777 0xfad 1_000_000",
        vec![
            Token::new(span(1, 7), int(11, 32, true)),
            Token::new(span(8, 13), int(0o777, 32, true)),
            Token::new(span(14, 19), int(0xfad, 32, true)),
            Token::new(span(20, 29), int(1_000_000, 32, true)),
            Token::new(span(29, 29), EndOfInput),
        ],
    );
}

#[test]
fn ranges_terminate_number_literals() {
    assert_lex_eq!(
        "0..10 1..=2 3..<4",
        vec![
            Token::new(span(1, 2), int(0, 32, true)),
            Token::new(span(2, 4), DotDot),
            Token::new(span(4, 6), int(10, 32, true)),
            Token::new(span(7, 8), int(1, 32, true)),
            Token::new(span(8, 11), DotDotEquals),
            Token::new(span(11, 12), int(2, 32, true)),
            Token::new(span(13, 14), int(3, 32, true)),
            Token::new(span(14, 17), DotDotLess),
            Token::new(span(17, 18), int(4, 32, true)),
            Token::new(span(18, 18), EndOfInput),
        ],
    );
}

#[test]
fn invalid_digit_for_base() {
    assert_lex_eq!(
        "0b12",
        vec![
            Token::new(span(1, 5), int(1, 32, true)),
            Token::new(span(5, 5), EndOfInput),
        ],
        vec![Error::new(span(1, 5), BareError::InvalidDigit { base: 2 })],
    );
}

#[test]
fn character_literals() {
    assert_lex_eq!(
        "'a' '\\n' '\\u{1F600}' '\\x41'",
        vec![
            Token::new(span(1, 4), CharLit('a')),
            Token::new(span(5, 9), CharLit('\n')),
            Token::new(span(10, 21), CharLit('😀')),
            Token::new(span(22, 28), CharLit('A')),
            Token::new(span(28, 28), EndOfInput),
        ],
    );
}

#[test]
fn text_literals_keep_escapes_unresolved() {
    assert_lex_eq!(
        r#""alpha" "a\"b""#,
        vec![
            Token::new(span(1, 8), Text("alpha".into())),
            Token::new(span(9, 15), Text(r#"a\"b"#.into())),
            Token::new(span(15, 15), EndOfInput),
        ],
    );
}

#[test]
fn byte_literals() {
    assert_lex_eq!(
        "b'A' b\"我\" b'\\xFF'",
        vec![
            Token::new(span(1, 5), ByteLit(65)),
            Token::new(span(6, 12), ByteText(vec![0xE6, 0x88, 0x91])),
            Token::new(span(13, 20), ByteLit(255)),
            Token::new(span(20, 20), EndOfInput),
        ],
    );
}

#[test]
fn byte_literal_out_of_range() {
    assert_lex_eq!(
        "b'я'",
        vec![Token::new(span(6, 6), EndOfInput)],
        vec![Error::new(span(1, 6), BareError::ByteOutOfRange)],
    );
}

#[test]
fn raw_text_fragments_merge() {
    assert_lex_eq!(
        "#|a\n#|b\n#|c\n",
        vec![
            Token::new(span(1, 13), RawText("a\nb\nc\n".into())),
            Token::new(span(13, 13), EndOfInput),
        ],
    );
}

#[test]
fn raw_text_merged_length_is_the_sum_of_the_fragments() {
    let outcome = lex("#|a\n#|b\n#|c\n");
    assert_eq!(outcome.tokens[0].span.length(), 3 * "#|a\n".len() as u32);
}

#[test]
fn raw_text_fragments_interrupted_by_code_stay_separate() {
    assert_lex_eq!(
        "#|a\nbeta\n#|c\n",
        vec![
            Token::new(span(1, 5), RawText("a\n".into())),
            Token::new(span(5, 9), Word("beta".into())),
            Token::new(span(9, 10), Newline),
            Token::new(span(10, 14), RawText("c\n".into())),
            Token::new(span(14, 14), EndOfInput),
        ],
    );
}

#[test]
fn maximal_munch_operators() {
    assert_lex_eq!(
        "|> && || << >> != ..=",
        vec![
            Token::new(span(1, 3), Pipeline),
            Token::new(span(4, 6), DoubleAmpersand),
            Token::new(span(7, 9), DoubleBar),
            Token::new(span(10, 12), DoubleLess),
            Token::new(span(13, 15), DoubleGreater),
            Token::new(span(16, 18), BangEquals),
            Token::new(span(19, 22), DotDotEquals),
            Token::new(span(22, 22), EndOfInput),
        ],
    );
}

#[test]
fn compound_assignment_operators() {
    assert_lex_eq!(
        "+= -= *= /= %= &= |= ^=",
        vec![
            Token::new(span(1, 3), PlusEquals),
            Token::new(span(4, 6), MinusEquals),
            Token::new(span(7, 9), AsteriskEquals),
            Token::new(span(10, 12), SlashEquals),
            Token::new(span(13, 15), PercentEquals),
            Token::new(span(16, 18), AmpersandEquals),
            Token::new(span(19, 21), BarEquals),
            Token::new(span(22, 24), CaretEquals),
            Token::new(span(24, 24), EndOfInput),
        ],
    );
}

#[test]
fn arrows_and_colons() {
    assert_lex_eq!(
        "-> => :: : = ==",
        vec![
            Token::new(span(1, 3), ThinArrow),
            Token::new(span(4, 6), WideArrow),
            Token::new(span(7, 9), DoubleColon),
            Token::new(span(10, 11), Colon),
            Token::new(span(12, 13), Equals),
            Token::new(span(14, 16), DoubleEquals),
            Token::new(span(16, 16), EndOfInput),
        ],
    );
}

#[test]
fn unterminated_text_literal() {
    assert_lex_eq!(
        "\"abc",
        vec![Token::new(span(5, 5), EndOfInput)],
        vec![Error::new(span(1, 5), BareError::UnterminatedTextLiteral)],
    );
}

#[test]
fn unterminated_character_literal() {
    assert_lex_eq!(
        "'a",
        vec![Token::new(span(3, 3), EndOfInput)],
        vec![Error::new(span(1, 3), BareError::UnterminatedCharLiteral)],
    );
}

#[test]
fn unknown_escape_sequence() {
    assert_lex_eq!(
        "'\\q'",
        vec![Token::new(span(5, 5), EndOfInput)],
        vec![
            Error::new(span(1, 5), BareError::InvalidEscape),
            Error::new(span(1, 5), BareError::EmptyCharLiteral),
        ],
    );
}

#[test]
fn invalid_character() {
    assert_lex_eq!(
        "alpha 💀",
        vec![
            Token::new(span(1, 6), Word("alpha".into())),
            Token::new(span(11, 11), EndOfInput),
        ],
        vec![Error::new(span(7, 11), BareError::InvalidToken('💀'))],
    );
}

/// Every token's span selects exactly its lexeme from the source.
#[test]
fn token_spans_select_their_lexemes() {
    let source = "fn plus(x: Int) { x + 40_000 } // trailer";
    let lexemes = [
        "fn", "plus", "(", "x", ":", "Int", ")", "{", "x", "+", "40_000", "}",
    ];

    let mut map = SourceMap::default();
    let file = map.add(FileName::Anonymous, Arc::new(source.to_owned()));
    let outcome = super::lex(&map[file]);

    assert!(outcome.errors.is_empty());
    // exclude the end of input token
    assert_eq!(outcome.tokens.len() - 1, lexemes.len());

    for (token, lexeme) in outcome.tokens.iter().zip(lexemes) {
        assert_eq!(map.snippet(token.span), lexeme);
        assert_eq!(token.span.length(), lexeme.len() as u32);
    }
}

/// The value of an accepted digit sequence is the base-weighted digit sum.
#[test]
fn integer_values_follow_positional_notation() {
    for (source, base, digits) in [
        ("0b101101", 2, "101101"),
        ("0o7154", 8, "7154"),
        ("90127", 10, "90127"),
        ("0xfAd9", 16, "fAd9"),
    ] {
        let expected = digits.chars().fold(0_i64, |value, digit| {
            value * i64::from(base) + i64::from(digit.to_digit(base as u32).unwrap())
        });

        let outcome = lex_source(source);
        assert!(outcome.errors.is_empty(), "{source} lexed with errors");
        match &outcome.tokens[0].bare {
            Int { value, .. } => assert_eq!(value, &expected.into(), "{source}"),
            token => panic!("{source} lexed to {token:?}"),
        }
    }
}

fn lex_source(source: &str) -> Outcome {
    super::lex_string(source.to_owned())
}

#[test]
fn suffixes_toggle_width_and_signedness() {
    for (source, len, signed) in [
        ("1", 32, true),
        ("1u", 32, false),
        ("1l", 64, true),
        ("1uL", 64, false),
        ("1lu", 64, false),
        ("1n", -1, true),
    ] {
        let outcome = lex_source(source);
        assert!(outcome.errors.is_empty());
        match &outcome.tokens[0].bare {
            Int { ty, .. } => assert_eq!(*ty, IntTy { len, signed }, "{source}"),
            token => panic!("{source} lexed to {token:?}"),
        }
    }
}

#[test]
fn float_suffix_on_integral_mantissa() {
    assert_lex_eq!(
        "1F",
        vec![
            Token::new(span(1, 3), FloatLit(1.0)),
            Token::new(span(3, 3), EndOfInput),
        ],
    );
}

#[test]
fn newline_spans_point_at_the_line_break() {
    let outcome = lex("a\nb");
    let newline = outcome
        .tokens
        .iter()
        .find(|token| matches!(token.bare, Newline))
        .unwrap();
    assert_eq!(newline.span, span(2, 3));
}

#[test]
fn errors_render_as_diagnostics() {
    let Spanned { bare, span } = lex("b'я'").errors.remove(0);
    let diagnostic = bare.into_diagnostic(span);

    let mut map = SourceMap::default();
    map.add_str(FileName::Anonymous, "b'я'");

    let rendered = diagnostic.format(Some(&map));
    assert!(rendered.contains("byte literal out of range"));
}
