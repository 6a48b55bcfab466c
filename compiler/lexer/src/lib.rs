//! The lexical analyzer (lexer).
//!
//! Number literals are converted into [big integers](utility::Int) right away,
//! identifiers are interned. Escape sequences inside text literals are *kept*
//! — the parser resolves them — except inside byte literals which leave the
//! lexer fully decoded.

use diagnostics::{Diagnostic, ErrorCode};
use span::{FileName, LocalByteIndex, LocalSpan, SourceFile, SourceMap, Span, Spanned};
use std::{iter::Peekable, mem, str::CharIndices, sync::Arc};
use token::{BareToken, IntTy, Token};
use utility::Atom;
use BareToken::*;

#[cfg(test)]
mod test;

pub fn lex(file: &SourceFile) -> Outcome {
    Lexer::new(file).lex()
}

#[derive(PartialEq, Debug)]
pub struct Outcome {
    pub tokens: Vec<Token>,
    pub errors: Vec<Error>,
}

/// The state of the lexer.
struct Lexer<'a> {
    characters: Peekable<CharIndices<'a>>,
    file: &'a SourceFile,
    tokens: Vec<Token>,
    errors: Vec<Error>,
    local_span: LocalSpan,
}

impl<'a> Lexer<'a> {
    fn new(file: &'a SourceFile) -> Self {
        Self {
            characters: file.content().char_indices().peekable(),
            file,
            tokens: Vec::new(),
            errors: Vec::new(),
            local_span: LocalSpan::default(),
        }
    }

    fn lex(mut self) -> Outcome {
        while let Some((index, character)) = self.peek_with_index() {
            self.local_span = LocalSpan::empty(index);

            match character {
                ' ' | '\t' | '\r' => self.advance(),
                '\n' => self.consume(Newline),
                '/' => self.lex_slash(),
                '@' => self.lex_packname(),
                '#' => self.lex_hash(),
                'b' if self.lookahead_is_quote() => self.lex_byte_literal(),
                character if is_word_start(character) => self.lex_word(),
                character if character.is_ascii_uppercase() => self.lex_typename(),
                character if character.is_ascii_digit() => self.lex_number_literal(),
                '\'' => self.lex_char_literal(),
                '"' => self.lex_text_literal(),
                _ => self.lex_punctuation(),
            }
        }

        self.merge_raw_text();

        self.local_span = LocalSpan::empty(self.file.local_span().end);
        self.add(EndOfInput);

        Outcome {
            tokens: self.tokens,
            errors: self.errors,
        }
    }

    /// Merge consecutive raw-text fragments into a single token.
    ///
    /// Each fragment carries its terminating line break, so two fragments
    /// originating from adjacent lines sit next to each other in the stream.
    fn merge_raw_text(&mut self) {
        let mut tokens = Vec::with_capacity(self.tokens.len());

        for token in mem::take(&mut self.tokens) {
            if let RawText(next) = &token.bare {
                if let Some(Spanned {
                    bare: RawText(merged),
                    span,
                }) = tokens.last_mut()
                {
                    if span.end == token.span.start {
                        debug_assert!(merged.to_str().ends_with('\n'));
                        *merged = Atom::from(format!("{merged}{next}"));
                        span.end = token.span.end;
                        continue;
                    }
                }
            }

            tokens.push(token);
        }

        self.tokens = tokens;
    }

    fn lex_slash(&mut self) {
        self.take();
        self.advance();

        match self.peek() {
            Some('/') => {
                while let Some(character) = self.peek() {
                    if character == '\n' {
                        break;
                    }
                    self.advance();
                }
            }
            Some('=') => {
                self.take();
                self.advance();
                self.add(SlashEquals);
            }
            _ => self.add(Slash),
        }
    }

    fn lex_packname(&mut self) {
        self.take();
        self.advance();

        match self.peek() {
            Some(character) if is_word_start(character) => {
                self.take_while(is_word_middle);
                let name = &self.source()['@'.len_utf8()..];
                self.add(Packname(name.into()));
            }
            _ => self.error(BareError::InvalidToken('@')),
        }
    }

    /// Lex an attribute (`#name`) or a raw-text fragment (`#|…`).
    fn lex_hash(&mut self) {
        self.take();
        self.advance();

        match self.peek() {
            Some('|') => {
                self.take();
                self.advance();
                self.take_while(|character| character != '\n');

                if self.peek() == Some('\n') {
                    self.take();
                    self.advance();
                }

                let content = &self.source()["#|".len()..];
                self.add(RawText(content.into()));
            }
            Some(character) if is_word_start(character) => {
                self.take_while(|character| is_word_middle(character) || character == '.');
                let name = &self.source()['#'.len_utf8()..];
                self.add(Attribute(name.into()));
            }
            _ => self.error(BareError::InvalidToken('#')),
        }
    }

    fn lex_word(&mut self) {
        self.take_while(is_word_middle);

        match lex_keyword(self.source()) {
            Some(Pub) => self.lex_pub(),
            Some(keyword) => self.add(keyword),
            None => self.add(Word(self.source().into())),
        }
    }

    /// Attach a directly following `(all)` or `(open)` to the keyword `pub`.
    fn lex_pub(&mut self) {
        let rest = &self.file.content()[usize::from(self.local_span.end)..];

        let (token, suffix) = if rest.starts_with("(all)") {
            (Puball, "(all)")
        } else if rest.starts_with("(open)") {
            (Pubopen, "(open)")
        } else {
            self.add(Pub);
            return;
        };

        for _ in 0..suffix.len() {
            self.take();
            self.advance();
        }
        self.add(token);
    }

    fn lex_typename(&mut self) {
        self.take_while(is_word_middle);
        self.add(Typename(self.source().into()));
    }

    fn lex_number_literal(&mut self) {
        let (_, first) = self.peek_with_index().unwrap();
        self.take();
        self.advance();

        let mut base: u32 = 10;
        let mut digits = String::new();

        if first == '0' {
            match self.peek() {
                Some('x' | 'X') => {
                    base = 16;
                    self.take();
                    self.advance();
                }
                Some('o') => {
                    base = 8;
                    self.take();
                    self.advance();
                }
                Some('b') => {
                    base = 2;
                    self.take();
                    self.advance();
                }
                _ => digits.push('0'),
            }
        } else {
            digits.push(first);
        }

        let mut fraction = String::new();
        let mut exponent = String::new();
        let mut is_floating = false;

        while let Some(character) = self.peek() {
            if character.is_digit(base) {
                self.take();
                self.advance();
                if is_floating {
                    fraction.push(character);
                } else {
                    digits.push(character);
                }
            } else if character == '_' {
                self.take();
                self.advance();
            } else if character == '.' && !is_floating {
                // `..` and friends directly after digits denote a range, not a fraction
                if self.lookahead() == Some('.') {
                    break;
                }
                self.take();
                self.advance();
                is_floating = true;
            } else if (base == 10 && matches!(character, 'e' | 'E'))
                || (base == 16 && matches!(character, 'p' | 'P'))
            {
                self.take();
                self.advance();
                is_floating = true;

                if let Some(sign @ ('+' | '-')) = self.peek() {
                    self.take();
                    self.advance();
                    exponent.push(sign);
                }

                while let Some(digit) = self.peek() {
                    if digit.is_ascii_digit() {
                        self.take();
                        self.advance();
                        exponent.push(digit);
                    } else if digit == '_' {
                        self.take();
                        self.advance();
                    } else {
                        break;
                    }
                }

                if exponent.trim_start_matches(['+', '-']).is_empty() {
                    self.error_here(BareError::InvalidDigit { base });
                }
                break;
            } else {
                break;
            }
        }

        let mut ty = IntTy::DEFAULT;
        let mut is_float = false;

        while let Some(character) = self.peek() {
            if !character.is_ascii_alphanumeric() {
                break;
            }

            match character {
                'f' | 'F' => {
                    self.take();
                    self.advance();
                    is_float = true;
                    break;
                }
                'n' | 'N' => {
                    self.take();
                    self.advance();
                    ty.len = -1;
                    break;
                }
                'u' | 'U' => {
                    self.take();
                    self.advance();
                    ty.signed = !ty.signed;
                }
                'l' | 'L' => {
                    self.take();
                    self.advance();
                    ty.len = if ty.len == 64 { 32 } else { 64 };
                }
                _ => {
                    // an invalid digit under the base (or stray letter): eat the whole run
                    self.take_while(char::is_alphanumeric);
                    self.error(BareError::InvalidDigit { base });
                    break;
                }
            }
        }

        if is_floating || is_float {
            let value = parse_floating(base, &digits, &fraction, &exponent);
            if is_float {
                self.add(FloatLit(value as f32));
            } else {
                self.add(Double(value));
            }
            return;
        }

        let value = match utility::Int::parse_bytes(digits.as_bytes(), base) {
            Some(value) => value,
            None => {
                self.error(BareError::InvalidDigit { base });
                utility::Int::from(0)
            }
        };

        self.add(Int { value, ty });
    }

    fn lex_char_literal(&mut self) {
        self.take();
        self.advance();

        let Some(content) = self.lex_quoted('\'') else {
            self.error(BareError::UnterminatedCharLiteral);
            return;
        };

        let (resolved, errors) = unescape(&self.file[content]);
        let reported = !errors.is_empty();
        for error in errors {
            self.error(error);
        }

        let mut characters = resolved.chars();
        match (characters.next(), characters.next()) {
            (Some(character), None) => self.add(CharLit(character)),
            (None, _) => self.error(BareError::EmptyCharLiteral),
            (Some(_), Some(_)) => {
                if !reported {
                    self.error(BareError::OversizedCharLiteral);
                }
            }
        }
    }

    fn lex_text_literal(&mut self) {
        self.take();
        self.advance();

        match self.lex_quoted('"') {
            Some(content) => self.add(Text(self.file[content].into())),
            None => self.error(BareError::UnterminatedTextLiteral),
        }
    }

    fn lex_byte_literal(&mut self) {
        // the `b` prefix
        self.take();
        self.advance();

        let quote = self.peek().unwrap();
        self.take();
        self.advance();

        let Some(content) = self.lex_quoted(quote) else {
            self.error(if quote == '\'' {
                BareError::UnterminatedCharLiteral
            } else {
                BareError::UnterminatedTextLiteral
            });
            return;
        };

        let (resolved, errors) = unescape(&self.file[content]);
        for error in errors {
            self.error(error);
        }

        if quote == '"' {
            self.add(ByteText(resolved.into_bytes()));
            return;
        }

        let mut characters = resolved.chars();
        match (characters.next(), characters.next()) {
            (Some(character), None) => match u8::try_from(u32::from(character)) {
                Ok(byte) => self.add(ByteLit(byte)),
                Err(_) => self.error(BareError::ByteOutOfRange),
            },
            (None, _) => self.error(BareError::EmptyCharLiteral),
            (Some(_), Some(_)) => self.error(BareError::OversizedCharLiteral),
        }
    }

    /// Consume up to and including the closing quote, returning the span of the interior.
    ///
    /// A quote counts as escaped iff it is preceded by an odd number of backslashes;
    /// escape sequences themselves are left untouched. Returns `None` at end of input.
    fn lex_quoted(&mut self, quote: char) -> Option<LocalSpan> {
        let start = self.local_span.end;

        loop {
            let (index, character) = self.peek_with_index()?;
            self.take();
            self.advance();

            if character == quote {
                return Some(LocalSpan::new(start, index));
            }

            if character == '\\' {
                // the escaped character, whatever it is, cannot close the literal
                if self.peek().is_some() {
                    self.take();
                    self.advance();
                }
            }
        }
    }

    fn lex_punctuation(&mut self) {
        let (_, character) = self.peek_with_index().unwrap();
        self.take();
        self.advance();

        let token = match character {
            '.' => match self.peek() {
                Some('.') => {
                    self.take();
                    self.advance();
                    match self.peek() {
                        Some('=') => {
                            self.take();
                            self.advance();
                            DotDotEquals
                        }
                        Some('<') => {
                            self.take();
                            self.advance();
                            DotDotLess
                        }
                        _ => DotDot,
                    }
                }
                _ => Dot,
            },
            ':' => self.continued(':', DoubleColon, Colon),
            '-' => match self.peek() {
                Some('>') => {
                    self.take();
                    self.advance();
                    ThinArrow
                }
                Some('=') => {
                    self.take();
                    self.advance();
                    MinusEquals
                }
                _ => Minus,
            },
            '=' => match self.peek() {
                Some('>') => {
                    self.take();
                    self.advance();
                    WideArrow
                }
                Some('=') => {
                    self.take();
                    self.advance();
                    DoubleEquals
                }
                _ => Equals,
            },
            '<' => match self.peek() {
                Some('=') => {
                    self.take();
                    self.advance();
                    LessEquals
                }
                Some('<') => {
                    self.take();
                    self.advance();
                    DoubleLess
                }
                _ => Less,
            },
            '>' => match self.peek() {
                Some('=') => {
                    self.take();
                    self.advance();
                    GreaterEquals
                }
                Some('>') => {
                    self.take();
                    self.advance();
                    DoubleGreater
                }
                _ => Greater,
            },
            '!' => self.continued('=', BangEquals, Bang),
            '+' => self.continued('=', PlusEquals, Plus),
            '*' => self.continued('=', AsteriskEquals, Asterisk),
            '%' => self.continued('=', PercentEquals, Percent),
            '&' => match self.peek() {
                Some('&') => {
                    self.take();
                    self.advance();
                    DoubleAmpersand
                }
                Some('=') => {
                    self.take();
                    self.advance();
                    AmpersandEquals
                }
                _ => Ampersand,
            },
            '|' => match self.peek() {
                Some('|') => {
                    self.take();
                    self.advance();
                    DoubleBar
                }
                Some('>') => {
                    self.take();
                    self.advance();
                    Pipeline
                }
                Some('=') => {
                    self.take();
                    self.advance();
                    BarEquals
                }
                _ => Bar,
            },
            '^' => self.continued('=', CaretEquals, Caret),
            ',' => Comma,
            ';' => Semicolon,
            '?' => QuestionMark,
            '(' => OpeningRoundBracket,
            ')' => ClosingRoundBracket,
            '[' => OpeningSquareBracket,
            ']' => ClosingSquareBracket,
            '{' => OpeningCurlyBracket,
            '}' => ClosingCurlyBracket,
            character => {
                self.error(BareError::InvalidToken(character));
                return;
            }
        };

        self.add(token);
    }

    /// Lex the two-character token if the given character follows, the fallback otherwise.
    fn continued(&mut self, character: char, consequent: BareToken, alternate: BareToken) -> BareToken {
        if self.peek() == Some(character) {
            self.take();
            self.advance();
            consequent
        } else {
            alternate
        }
    }

    fn span(&self) -> Span {
        self.local_span.global(self.file)
    }

    fn source(&self) -> &'a str {
        &self.file[self.local_span]
    }

    /// Step to the next character in the input stream.
    fn advance(&mut self) {
        self.characters.next();
    }

    /// Include the span of the current character in the span of the token-to-be-added.
    ///
    /// Preparation for [`Self::add`] and variants.
    fn take(&mut self) {
        let (index, character) = self.peek_with_index().unwrap();
        self.local_span.set_end(index + character);
    }

    fn peek(&mut self) -> Option<char> {
        self.peek_with_index().map(|(_, character)| character)
    }

    fn peek_with_index(&mut self) -> Option<(LocalByteIndex, char)> {
        self.characters
            .peek()
            .map(|&(index, character)| (index.try_into().unwrap(), character))
    }

    /// The character after the current one, without consuming anything.
    fn lookahead(&self) -> Option<char> {
        let mut characters = self.characters.clone();
        characters.next();
        characters.next().map(|(_, character)| character)
    }

    fn lookahead_is_quote(&self) -> bool {
        matches!(self.lookahead(), Some('\'' | '"'))
    }

    /// [Take](Self::take) the span of all succeeding characters where the predicate holds and step.
    fn take_while(&mut self, predicate: impl ::std::ops::Fn(char) -> bool) {
        while let Some(character) = self.peek() {
            if !predicate(character) {
                break;
            }
            self.take();
            self.advance();
        }
    }

    /// Add a token with the given kind to the output of the lexer.
    ///
    /// The other component of a token – the span – is stored in the lexer and is most
    /// commonly updated using [`Self::take`].
    fn add(&mut self, token: BareToken) {
        let span = self.span();
        self.tokens.push(Token::new(span, token));
    }

    fn error(&mut self, error: BareError) {
        self.errors.push(Error::new(self.span(), error));
    }

    /// Report an error at the current cursor position rather than the running span.
    fn error_here(&mut self, error: BareError) {
        let span = match self.peek_with_index() {
            Some((index, _)) => LocalSpan::empty(index),
            None => LocalSpan::empty(self.file.local_span().end),
        };
        self.errors.push(Error::new(span.global(self.file), error));
    }

    fn consume(&mut self, token: BareToken) {
        self.take();
        self.advance();
        self.add(token);
    }
}

pub fn lex_string(source: String) -> Outcome {
    let mut map = SourceMap::default();
    let file = map.add(FileName::Anonymous, Arc::new(source));
    Lexer::new(&map[file]).lex()
}

const fn is_word_start(character: char) -> bool {
    character.is_ascii_lowercase() || character == '_'
}

const fn is_word_middle(character: char) -> bool {
    character.is_ascii_alphanumeric() || character == '_'
}

fn lex_keyword(source: &str) -> Option<BareToken> {
    Some(match source {
        "abstract" => Abstract,
        "as" => As,
        "break" => Break,
        "continue" => Continue,
        "else" => Else,
        "enum" => Enum,
        "false" => False,
        "ffi" => Ffi,
        "fn" => Fn,
        "for" => For,
        "guard" => Guard,
        "if" => If,
        "impl" => Impl,
        "in" => In,
        "is" => Is,
        "let" => Let,
        "match" => Match,
        "mut" => Mut,
        "pub" => Pub,
        "return" => Return,
        "struct" => Struct,
        "test" => Test,
        "trait" => Trait,
        "true" => True,
        "type" => Type,
        "use" => Use,
        "while" => While,
        _ => return None,
    })
}

/// The mantissa of a floating-point literal, interpreted in the given base.
///
/// Decimal literals round-trip through the standard parser; hexadecimal ones
/// scale the fraction by powers of the base and the whole mantissa by a power
/// of two (`p` exponents are binary exponents).
fn parse_floating(base: u32, digits: &str, fraction: &str, exponent: &str) -> f64 {
    if base == 10 {
        let mut literal = String::with_capacity(digits.len() + fraction.len() + exponent.len() + 2);
        literal.push_str(if digits.is_empty() { "0" } else { digits });
        literal.push('.');
        literal.push_str(if fraction.is_empty() { "0" } else { fraction });
        if !exponent.is_empty() {
            literal.push('e');
            literal.push_str(exponent);
        }
        return literal.parse().unwrap_or(0.0);
    }

    let mut value = 0.0_f64;
    for digit in digits.chars() {
        value = value * f64::from(base) + f64::from(digit.to_digit(base).unwrap());
    }

    let mut scale = 1.0 / f64::from(base);
    for digit in fraction.chars() {
        value += f64::from(digit.to_digit(base).unwrap()) * scale;
        scale /= f64::from(base);
    }

    if !exponent.is_empty() {
        let power: i32 = exponent.parse().unwrap_or(0);
        value *= 2.0_f64.powi(power);
    }

    value
}

/// Resolve the escape sequences inside the raw interior of a quoted literal.
fn unescape(raw: &str) -> (String, Vec<BareError>) {
    let mut resolved = String::with_capacity(raw.len());
    let mut errors = Vec::new();
    let mut characters = raw.chars().peekable();

    while let Some(character) = characters.next() {
        if character != '\\' {
            resolved.push(character);
            continue;
        }

        match characters.next() {
            None => errors.push(BareError::InvalidEscape),
            Some('n') => resolved.push('\n'),
            Some('t') => resolved.push('\t'),
            Some('r') => resolved.push('\r'),
            Some('b') => resolved.push('\u{8}'),
            Some('0') => resolved.push('\0'),
            Some('\\') => resolved.push('\\'),
            Some('"') => resolved.push('"'),
            Some('\'') => resolved.push('\''),
            Some('u') => {
                let mut digits = String::new();

                if characters.peek() == Some(&'{') {
                    characters.next();
                    while let Some(&digit) = characters.peek() {
                        if digit == '}' {
                            characters.next();
                            break;
                        }
                        if !digit.is_ascii_hexdigit() {
                            break;
                        }
                        digits.push(digit);
                        characters.next();
                    }
                } else {
                    for _ in 0..4 {
                        match characters.peek() {
                            Some(&digit) if digit.is_ascii_hexdigit() => {
                                digits.push(digit);
                                characters.next();
                            }
                            _ => break,
                        }
                    }
                }

                if digits.is_empty() {
                    errors.push(BareError::InvalidEscape);
                    continue;
                }

                match u32::from_str_radix(&digits, 16)
                    .ok()
                    .and_then(char::from_u32)
                {
                    Some(character) => resolved.push(character),
                    None => errors.push(BareError::InvalidCodePoint),
                }
            }
            Some('x') => {
                let mut digits = String::new();
                for _ in 0..2 {
                    match characters.peek() {
                        Some(&digit) if digit.is_ascii_hexdigit() => {
                            digits.push(digit);
                            characters.next();
                        }
                        _ => break,
                    }
                }

                if digits.len() != 2 {
                    errors.push(BareError::InvalidEscape);
                    continue;
                }

                // two hex digits are always a valid scalar value
                resolved.push(char::from_u32(u32::from_str_radix(&digits, 16).unwrap()).unwrap());
            }
            Some(_) => errors.push(BareError::InvalidEscape),
        }
    }

    (resolved, errors)
}

pub type Error = Spanned<BareError>;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BareError {
    ByteOutOfRange,
    EmptyCharLiteral,
    InvalidCodePoint,
    InvalidDigit { base: u32 },
    InvalidEscape,
    InvalidToken(char),
    OversizedCharLiteral,
    UnterminatedCharLiteral,
    UnterminatedTextLiteral,
}

impl BareError {
    pub fn into_diagnostic(self, span: Span) -> Diagnostic {
        use BareError::*;

        let diagnostic = match self {
            ByteOutOfRange => Diagnostic::error()
                .code(ErrorCode::E005)
                .message("byte literal out of range")
                .note("a byte has to fit into the range 0 to 255 inclusive"),
            EmptyCharLiteral => Diagnostic::error()
                .code(ErrorCode::E007)
                .message("character literal is empty"),
            InvalidCodePoint => Diagnostic::error()
                .code(ErrorCode::E006)
                .message("escape does not denote a Unicode scalar value"),
            InvalidDigit { base } => Diagnostic::error()
                .code(ErrorCode::E001)
                .message(format!("invalid digit for a base {base} integer literal")),
            InvalidEscape => Diagnostic::error()
                .code(ErrorCode::E002)
                .message("unknown escape sequence"),
            InvalidToken(character) => Diagnostic::error()
                .code(ErrorCode::E000)
                .message(format!("found invalid character U+{:04X} ‘{character}’", character as u32)),
            OversizedCharLiteral => Diagnostic::error()
                .code(ErrorCode::E004)
                .message("character literal contains more than one character"),
            UnterminatedCharLiteral => Diagnostic::error()
                .code(ErrorCode::E004)
                .message("unterminated character literal"),
            UnterminatedTextLiteral => Diagnostic::error()
                .code(ErrorCode::E003)
                .message("unterminated text literal"),
        };

        diagnostic.primary_span(span)
    }
}
