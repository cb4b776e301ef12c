//! Text interpolation.
//!
//! A text run is split into alternating literal and expression segments on the
//! `{{` … `}}` delimiter pair. The caller emits the segments as consecutive
//! arguments, so a run like `Hi {{name}}!` becomes three children of the
//! enclosing element.

pub const OPEN_DELIMITER: &str = "{{";
pub const CLOSE_DELIMITER: &str = "}}";
pub const ESCAPE_CHAR: u8 = b'\\';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Expr(String),
}

/// Trim a literal and fold its line breaks (with their indentation) into single spaces.
pub fn normalize_literal(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn push_literal(out: &mut Vec<Segment>, text: &str) {
    let literal = normalize_literal(text);
    if !literal.is_empty() {
        out.push(Segment::Literal(literal));
    }
}

/// Split a whole text run. Blank text yields no segments at all.
pub fn interpolate(text: &str) -> Vec<Segment> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    match text.find(OPEN_DELIMITER) {
        Some(open) => interpolate_from(text, open),
        None => {
            let mut out = Vec::new();
            push_literal(&mut out, text);
            out
        }
    }
}

/// Split `text` starting at the open delimiter found at byte offset `open`.
///
/// Each step consumes one delimiter pair and continues on the strictly shorter
/// remainder. An escaped open delimiter (`\{{`) turns the remainder into one
/// literal with the escape removed; an open delimiter with no closing one makes
/// the remainder a literal as-is.
pub fn interpolate_from(text: &str, open: usize) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut rest = text;
    let mut next_open = Some(open);

    while let Some(open) = next_open {
        if open > 0 && rest.as_bytes()[open - 1] == ESCAPE_CHAR {
            let unescaped = format!("{}{}", &rest[..open - 1], &rest[open..]);
            push_literal(&mut out, &unescaped);
            return out;
        }

        let body_start = open + OPEN_DELIMITER.len();
        let Some(close) = rest[body_start..].find(CLOSE_DELIMITER) else {
            push_literal(&mut out, rest);
            return out;
        };

        push_literal(&mut out, &rest[..open]);
        let expr = rest[body_start..body_start + close].trim();
        if !expr.is_empty() {
            out.push(Segment::Expr(expr.to_string()));
        }

        rest = &rest[body_start + close + CLOSE_DELIMITER.len()..];
        next_open = rest.find(OPEN_DELIMITER);
    }

    push_literal(&mut out, rest);
    out
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
