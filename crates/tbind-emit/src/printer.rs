//! Wadler-Lindig printer for the format IR.
//!
//! A work stack of `(indent, mode, node)` commands. At each `Group` the
//! printer measures the group's first line in flat mode; if it fits in the
//! remaining width the group renders flat, otherwise broken. Hard line
//! breaks inside a flat group still break, so a closure body inside an
//! argument list keeps its block layout while the arguments stay inline.

use crate::ir::FormatIR;

#[derive(Debug, Clone)]
pub struct EmitConfig {
    /// Spaces per indentation level. Default: 2.
    pub indent_size: usize,
    /// Line width before groups break. Default: 80.
    pub max_width: usize,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            indent_size: 2,
            max_width: 80,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Flat,
    Break,
}

#[derive(Debug)]
struct PrintCmd<'a> {
    indent: usize,
    mode: Mode,
    ir: &'a FormatIR,
}

/// Printed text plus the output offset of every `Mark`, indexed by mark id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Printed {
    pub text: String,
    pub marks: Vec<usize>,
}

/// Render `ir`. Non-empty output always ends with a newline.
pub fn print(ir: &FormatIR, config: &EmitConfig) -> Printed {
    let mut out = String::new();
    let mut marks: Vec<usize> = Vec::new();
    let mut col: usize = 0;
    let mut stack: Vec<PrintCmd> = vec![PrintCmd {
        indent: 0,
        mode: Mode::Break,
        ir,
    }];

    let newline = |out: &mut String, col: &mut usize, indent: usize| {
        out.push('\n');
        out.push_str(&" ".repeat(indent));
        *col = indent;
    };

    while let Some(cmd) = stack.pop() {
        match cmd.ir {
            FormatIR::Empty => {}

            FormatIR::Text(s) => {
                out.push_str(s);
                // Verbatim text may span lines.
                col = match s.rfind('\n') {
                    Some(i) => s.len() - i - 1,
                    None => col + s.len(),
                };
            }

            FormatIR::Space => match cmd.mode {
                Mode::Flat => {
                    out.push(' ');
                    col += 1;
                }
                Mode::Break => newline(&mut out, &mut col, cmd.indent),
            },

            FormatIR::Hardline => newline(&mut out, &mut col, cmd.indent),

            FormatIR::Mark(id) => {
                if marks.len() <= *id {
                    marks.resize(*id + 1, 0);
                }
                marks[*id] = out.len();
            }

            FormatIR::Indent(child) => stack.push(PrintCmd {
                indent: cmd.indent + config.indent_size,
                mode: cmd.mode,
                ir: child,
            }),

            FormatIR::Group(child) => {
                let mode = if col + first_line_width(child) <= config.max_width {
                    Mode::Flat
                } else {
                    Mode::Break
                };
                stack.push(PrintCmd {
                    indent: cmd.indent,
                    mode,
                    ir: child,
                });
            }

            FormatIR::IfBreak { flat, broken } => stack.push(PrintCmd {
                indent: cmd.indent,
                mode: cmd.mode,
                ir: if cmd.mode == Mode::Flat { &**flat } else { &**broken },
            }),

            FormatIR::Concat(parts) => {
                for part in parts.iter().rev() {
                    stack.push(PrintCmd {
                        indent: cmd.indent,
                        mode: cmd.mode,
                        ir: part,
                    });
                }
            }
        }
    }

    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }

    Printed { text: out, marks }
}

/// Flat width of `ir` up to its first hard line break.
fn first_line_width(ir: &FormatIR) -> usize {
    measure(ir).0
}

/// `(width, stopped)`; `stopped` is set once a hard break was reached.
fn measure(ir: &FormatIR) -> (usize, bool) {
    match ir {
        FormatIR::Empty | FormatIR::Mark(_) => (0, false),
        FormatIR::Text(s) => match s.find('\n') {
            Some(i) => (i, true),
            None => (s.len(), false),
        },
        FormatIR::Space => (1, false),
        FormatIR::Hardline => (0, true),
        FormatIR::Indent(child) | FormatIR::Group(child) => measure(child),
        FormatIR::IfBreak { flat, .. } => measure(flat),
        FormatIR::Concat(parts) => {
            let mut total: usize = 0;
            for part in parts {
                let (w, stopped) = measure(part);
                total = total.saturating_add(w);
                if stopped {
                    return (total, true);
                }
            }
            (total, false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::*;

    fn narrow(max_width: usize) -> EmitConfig {
        EmitConfig {
            indent_size: 2,
            max_width,
        }
    }

    fn render(ir: &FormatIR, config: &EmitConfig) -> String {
        print(ir, config).text
    }

    #[test]
    fn group_fits_renders_flat() {
        let ir = group(concat(vec![text("a"), space(), text("b")]));
        assert_eq!(render(&ir, &EmitConfig::default()), "a b\n");
    }

    #[test]
    fn group_exceeds_width_breaks() {
        let ir = group(concat(vec![
            text("hello"),
            space(),
            text("beautiful"),
            space(),
            text("world"),
        ]));
        assert_eq!(render(&ir, &narrow(10)), "hello\nbeautiful\nworld\n");
    }

    #[test]
    fn indent_adds_spaces() {
        let ir = concat(vec![
            text("{"),
            indent(concat(vec![hardline(), text("body;")])),
            hardline(),
            text("}"),
        ]);
        assert_eq!(render(&ir, &EmitConfig::default()), "{\n  body;\n}\n");
    }

    #[test]
    fn delimited_list_flat_and_broken() {
        let items = || vec![text("alpha"), text("beta")];
        let ir = delimited("(", items(), ")", false);
        assert_eq!(render(&ir, &EmitConfig::default()), "(alpha, beta)\n");
        let ir = delimited("(", items(), ")", false);
        assert_eq!(render(&ir, &narrow(8)), "(\n  alpha,\n  beta,\n)\n");
        let ir = delimited("{", items(), "}", true);
        assert_eq!(render(&ir, &EmitConfig::default()), "{ alpha, beta }\n");
    }

    #[test]
    fn hardline_in_group_only_measures_first_line() {
        // `f(() => {` fits, so the arguments stay inline around the block.
        let body = concat(vec![
            text("() => {"),
            indent(concat(vec![hardline(), text("a_fairly_long_statement;")])),
            hardline(),
            text("}"),
        ]);
        let ir = delimited("f(", vec![body], ")", false);
        assert_eq!(
            render(&ir, &narrow(12)),
            "f(() => {\n  a_fairly_long_statement;\n})\n"
        );
    }

    #[test]
    fn marks_record_offsets() {
        let ir = concat(vec![text("ab"), FormatIR::Mark(1), text("cd"), FormatIR::Mark(0)]);
        let printed = print(&ir, &EmitConfig::default());
        assert_eq!(printed.marks, vec![4, 2]);
    }

    #[test]
    fn empty_produces_nothing() {
        assert_eq!(render(&FormatIR::Empty, &EmitConfig::default()), "");
    }
}
