//! Wadler-Lindig document IR.
//!
//! The walker describes layout intent (groups, indentation, line breaks);
//! the printer decides at each `Group` whether it renders flat or broken.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatIR {
    /// Literal text emitted verbatim.
    Text(String),
    /// A space in flat mode; a newline plus indent in broken mode.
    Space,
    /// Always a newline plus the current indentation.
    Hardline,
    /// Increase indentation for the child.
    Indent(Box<FormatIR>),
    /// Render the child flat if its first line fits, broken otherwise.
    Group(Box<FormatIR>),
    /// Choose content by the enclosing group's mode.
    IfBreak {
        flat: Box<FormatIR>,
        broken: Box<FormatIR>,
    },
    Concat(Vec<FormatIR>),
    /// Zero-width position marker; the printer records its output offset.
    Mark(usize),
    Empty,
}

pub fn text(s: impl Into<String>) -> FormatIR {
    FormatIR::Text(s.into())
}

pub fn space() -> FormatIR {
    FormatIR::Space
}

pub fn hardline() -> FormatIR {
    FormatIR::Hardline
}

pub fn indent(ir: FormatIR) -> FormatIR {
    FormatIR::Indent(Box::new(ir))
}

pub fn group(ir: FormatIR) -> FormatIR {
    FormatIR::Group(Box::new(ir))
}

pub fn concat(parts: Vec<FormatIR>) -> FormatIR {
    FormatIR::Concat(parts)
}

pub fn if_break(flat: FormatIR, broken: FormatIR) -> FormatIR {
    FormatIR::IfBreak {
        flat: Box::new(flat),
        broken: Box::new(broken),
    }
}

/// `items` separated by `sep`.
pub fn join(items: Vec<FormatIR>, sep: impl Fn() -> FormatIR) -> FormatIR {
    let mut parts = Vec::with_capacity(items.len() * 2);
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            parts.push(sep());
        }
        parts.push(item);
    }
    concat(parts)
}

/// A delimited, comma-separated list that breaks one item per line:
/// `(a, b)` flat, or open / indented items with a trailing comma / close.
///
/// The flat layout does not indent, so a block inside a flat list (a
/// closure argument) lines up with the line the list starts on.
pub fn delimited(open: &str, items: Vec<FormatIR>, close: &str, padded: bool) -> FormatIR {
    if items.is_empty() {
        return text(format!("{open}{close}"));
    }
    let pad = if padded { text(" ") } else { FormatIR::Empty };
    let flat = concat(vec![
        text(open),
        pad.clone(),
        join(items.clone(), || text(", ")),
        pad,
        text(close),
    ]);
    let broken = concat(vec![
        text(open),
        indent(concat(vec![
            hardline(),
            join(items, || concat(vec![text(","), hardline()])),
            text(","),
        ])),
        hardline(),
        text(close),
    ]);
    group(if_break(flat, broken))
}
