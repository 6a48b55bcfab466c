//! The terminal renderer for diagnostics.

use super::{Role, Severity, Subseverity, UnboxedDiagnostic};
use colored::{Color, Colorize};
use span::SourceMap;
use std::fmt::Write;

pub(super) fn format(diagnostic: &UnboxedDiagnostic, map: Option<&SourceMap>) -> String {
    let mut message = String::new();

    render_header(diagnostic, &mut message);

    let padding = padding(diagnostic, map);

    let mut rendered_any = false;
    for highlight in &diagnostic.highlights {
        // unknown locations and maplessness degrade to a bare message
        let Some(map) = map else { continue };
        if highlight.span == span::Span::default() {
            continue;
        }
        let lines = map.lines_with_highlight(highlight.span);
        let index = usize::from(std::mem::replace(&mut rendered_any, true));

        if index == 0 {
            let _ = write!(
                message,
                "\n{padding}{arrow} {file}:{line}:{column}",
                arrow = "-->".bright_blue().bold(),
                file = lines.file,
                line = lines.first.number,
                column = lines.first.highlight.start,
            );
        }

        let bar = bar();
        let _ = write!(message, "\n{padding} {bar}");

        let color = match highlight.role {
            Role::Primary => diagnostic.severity.color(),
            Role::Secondary => Color::BrightBlue,
        };

        render_snippet_line(&lines.first, &padding, highlight.role, color, &mut message);

        if let Some(last) = &lines.last {
            render_snippet_line(last, &padding, highlight.role, color, &mut message);
        }

        if let Some(label) = &highlight.label {
            let _ = write!(message, " {}", label.color(color));
        }
    }

    for subdiagnostic in &diagnostic.subdiagnostics {
        let _ = write!(
            message,
            "\n{padding}{severity}: ",
            severity = subdiagnostic.severity.render(),
        );

        for (index, line) in subdiagnostic.message.lines().enumerate() {
            if index == 0 {
                message += line;
            } else {
                let _ = write!(message, "\n{padding}   {line}");
            }
        }
    }

    message
}

fn render_header(diagnostic: &UnboxedDiagnostic, message: &mut String) {
    let severity = match diagnostic.severity {
        Severity::Bug => "internal compiler error",
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Debug => "internal debugging message",
    };

    let code = diagnostic
        .code
        .map(|code| format!("[{code}]"))
        .unwrap_or_default();

    let _ = write!(
        message,
        "{}",
        format!("{severity}{code}").color(diagnostic.severity.color()).bold()
    );

    if let Some(text) = &diagnostic.message {
        let _ = write!(message, "{}", ": ".bold());
        let _ = write!(message, "{}", text.bold());
    }
}

fn render_snippet_line(
    line: &span::source_map::LineWithHighlight<'_>,
    padding: &str,
    role: Role,
    color: Color,
    message: &mut String,
) {
    let bar = bar();
    let number = line.number;
    let number_padding = padding.len() - number.to_string().len() - 1;

    let _ = write!(
        message,
        "\n{} {bar} {}",
        format!("{}{number}", " ".repeat(number_padding)).bright_blue().bold(),
        line.content,
    );
    let _ = write!(
        message,
        "\n{padding} {bar} {}{}",
        " ".repeat(line.highlight.prefix_width),
        role.symbol()
            .repeat(line.highlight.width)
            .color(color)
            .bold(),
    );
}

/// The amount of padding needed to align line numbers and bars.
fn padding(diagnostic: &UnboxedDiagnostic, map: Option<&SourceMap>) -> String {
    let widest_line_number = diagnostic
        .highlights
        .iter()
        .filter_map(|highlight| {
            let map = map?;
            if highlight.span == span::Span::default() {
                return None;
            }
            let lines = map.lines_with_highlight(highlight.span);
            Some(lines.last.as_ref().map_or(lines.first.number, |last| last.number))
        })
        .max()
        .unwrap_or(0);

    " ".repeat(widest_line_number.to_string().len() + 1)
}

fn bar() -> colored::ColoredString {
    "|".bright_blue().bold()
}

impl Severity {
    pub(super) fn color(self) -> Color {
        match self {
            Self::Bug | Self::Error => Color::BrightRed,
            Self::Warning => Color::BrightYellow,
            Self::Debug => Color::BrightMagenta,
        }
    }
}

impl Subseverity {
    fn render(self) -> colored::ColoredString {
        match self {
            Self::Note => "note".bright_blue().bold(),
            Self::Help => "help".bright_cyan().bold(),
        }
    }
}

impl Role {
    fn symbol(self) -> &'static str {
        match self {
            Self::Primary => "^",
            Self::Secondary => "-",
        }
    }
}
