//! Printer that lays out a document within a line width
//!
//! Groups are printed flat when their contents, up to the next possible
//! newline, fit on the current line. Otherwise they break and every
//! breakable directly inside them becomes a newline. Line suffixes are
//! buffered and written just before the next newline.

use super::format_element::{FormatElement, GroupMode};
use unicode_width::UnicodeWidthStr;

/// Configuration for the printer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterOptions {
    /// Maximum line width before groups break
    pub line_width: usize,
    /// Spaces per indentation level
    pub indent_size: usize,
}

impl Default for PrinterOptions {
    fn default() -> Self {
        Self {
            line_width: 80,
            indent_size: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Break,
    Flat,
}

#[derive(Clone, Copy)]
struct Command<'a> {
    indent: usize,
    mode: Mode,
    element: &'a FormatElement,
}

struct Suffix<'a> {
    priority: u8,
    indent: usize,
    mode: Mode,
    contents: &'a [FormatElement],
}

pub struct Printer {
    options: PrinterOptions,
}

impl Printer {
    pub fn new(options: PrinterOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PrinterOptions {
        &self.options
    }

    /// Lay out a document
    pub fn print(&self, document: &[FormatElement]) -> String {
        let mut buffer = String::new();
        let mut position = 0usize;
        let mut should_remeasure = false;
        let mut suffixes: Vec<Suffix<'_>> = Vec::new();
        let mut commands: Vec<Command<'_>> = Vec::new();
        push_contents(&mut commands, 0, Mode::Break, document);

        loop {
            let Some(command) = commands.pop() else {
                if suffixes.is_empty() {
                    break;
                }
                flush_suffixes(&mut commands, &mut suffixes);
                continue;
            };
            let Command {
                indent,
                mode,
                element,
            } = command;

            match element {
                FormatElement::Text { text, width } => {
                    buffer.push_str(text);
                    position = match text.rfind('\n') {
                        Some(index) => text[index + 1..].width(),
                        None => position + width,
                    };
                }
                FormatElement::Group {
                    mode: group_mode,
                    contents,
                    ..
                } => {
                    let broken = *group_mode == GroupMode::Broken;
                    if mode == Mode::Flat && !should_remeasure {
                        let next = if broken { Mode::Break } else { Mode::Flat };
                        push_contents(&mut commands, indent, next, contents);
                    } else {
                        should_remeasure = false;
                        let next = if broken {
                            Mode::Break
                        } else if *group_mode == GroupMode::Flat {
                            Mode::Flat
                        } else {
                            let remaining = self.options.line_width as isize - position as isize;
                            let mut next_commands = Vec::new();
                            push_contents(&mut next_commands, indent, Mode::Flat, contents);
                            if fits(next_commands, &commands, remaining) {
                                Mode::Flat
                            } else {
                                Mode::Break
                            }
                        };
                        push_contents(&mut commands, indent, next, contents);
                    }
                }
                FormatElement::Indent(contents) => {
                    push_contents(
                        &mut commands,
                        indent + self.options.indent_size,
                        mode,
                        contents,
                    );
                }
                FormatElement::Align { width, contents } => {
                    let indent = (indent as isize + width).max(0) as usize;
                    push_contents(&mut commands, indent, mode, contents);
                }
                FormatElement::IfBreak {
                    break_contents,
                    flat_contents,
                } => {
                    let contents = match mode {
                        Mode::Break => break_contents,
                        Mode::Flat => flat_contents,
                    };
                    push_contents(&mut commands, indent, mode, contents);
                }
                FormatElement::LineSuffix { priority, contents } => {
                    suffixes.push(Suffix {
                        priority: *priority,
                        indent,
                        mode,
                        contents,
                    });
                }
                FormatElement::Breakable {
                    separator,
                    width,
                    indent: indented,
                    force,
                } => {
                    if mode == Mode::Flat {
                        if *force {
                            should_remeasure = true;
                        } else {
                            buffer.push_str(separator);
                            position += width;
                            continue;
                        }
                    }

                    if !suffixes.is_empty() {
                        commands.push(command);
                        flush_suffixes(&mut commands, &mut suffixes);
                        continue;
                    }

                    if *indented {
                        trim(&mut buffer);
                        buffer.push('\n');
                        buffer.extend(std::iter::repeat_n(' ', indent));
                        position = indent;
                    } else {
                        buffer.push('\n');
                        position = 0;
                    }
                }
                FormatElement::Trim => {
                    position -= trim(&mut buffer).min(position);
                }
                FormatElement::BreakParent => {}
            }
        }

        buffer
    }
}

fn push_contents<'a>(
    commands: &mut Vec<Command<'a>>,
    indent: usize,
    mode: Mode,
    contents: &'a [FormatElement],
) {
    commands.extend(contents.iter().rev().map(|element| Command {
        indent,
        mode,
        element,
    }));
}

/// Queue buffered suffixes so the lowest priority prints first and equal
/// priorities keep their insertion order
fn flush_suffixes<'a>(commands: &mut Vec<Command<'a>>, suffixes: &mut Vec<Suffix<'a>>) {
    let mut pending = std::mem::take(suffixes);
    pending.sort_by_key(|suffix| suffix.priority);
    for suffix in pending.iter().rev() {
        push_contents(commands, suffix.indent, suffix.mode, suffix.contents);
    }
}

/// Remove trailing spaces and tabs, returning how many were removed
fn trim(buffer: &mut String) -> usize {
    let trimmed = buffer.trim_end_matches([' ', '\t']).len();
    let removed = buffer.len() - trimmed;
    buffer.truncate(trimmed);
    removed
}

/// Whether `next` fits in `remaining` columns, looking into `rest` until the
/// first newline
fn fits<'a>(mut next: Vec<Command<'a>>, rest: &[Command<'a>], mut remaining: isize) -> bool {
    let mut rest_index = rest.len();
    let mut line = String::new();

    while remaining >= 0 {
        let command = match next.pop() {
            Some(command) => command,
            None => {
                if rest_index == 0 {
                    return true;
                }
                rest_index -= 1;
                rest[rest_index]
            }
        };
        let Command {
            indent,
            mode,
            element,
        } = command;

        match element {
            FormatElement::Text { text, width } => {
                line.push_str(text);
                remaining -= *width as isize;
            }
            FormatElement::Breakable {
                separator,
                width,
                force,
                ..
            } => {
                if mode == Mode::Break || *force {
                    return true;
                }
                line.push_str(separator);
                remaining -= *width as isize;
            }
            FormatElement::Group {
                mode: group_mode,
                contents,
                ..
            } => {
                let mode = if *group_mode == GroupMode::Broken {
                    Mode::Break
                } else {
                    mode
                };
                push_contents(&mut next, indent, mode, contents);
            }
            FormatElement::IfBreak {
                break_contents,
                flat_contents,
            } => {
                let contents = match mode {
                    Mode::Break => break_contents,
                    Mode::Flat => flat_contents,
                };
                push_contents(&mut next, indent, mode, contents);
            }
            FormatElement::Indent(contents) | FormatElement::Align { contents, .. } => {
                push_contents(&mut next, indent, mode, contents);
            }
            FormatElement::Trim => {
                remaining += trim(&mut line) as isize;
            }
            FormatElement::LineSuffix { .. } | FormatElement::BreakParent => {}
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::format_element::{
        COMMENT_PRIORITY, DocBuilder, HEREDOC_PRIORITY, Layout, separator,
    };

    fn print(width: usize, build: impl FnOnce(&mut DocBuilder)) -> String {
        let mut doc = DocBuilder::new();
        build(&mut doc);
        let printer = Printer::new(PrinterOptions {
            line_width: width,
            ..PrinterOptions::default()
        });
        printer.print(&doc.finish())
    }

    fn call(q: &mut DocBuilder, args: &[&str]) {
        q.group(|q| {
            q.text("foo(");
            q.indent(|q| {
                q.breakable_empty();
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        q.text(",");
                        q.breakable_space();
                    }
                    q.text(*arg);
                }
                q.if_broken(|q| q.text(","));
            });
            q.breakable_empty();
            q.text(")");
        });
    }

    #[test]
    fn test_group_fits_on_one_line() {
        assert_eq!(print(80, |q| call(q, &["a", "b"])), "foo(a, b)");
    }

    #[test]
    fn test_group_breaks_when_too_wide() {
        let output = print(10, |q| call(q, &["alpha", "beta"]));
        assert_eq!(output, "foo(\n  alpha,\n  beta,\n)");
    }

    #[test]
    fn test_exact_width_fits() {
        assert_eq!(print(9, |q| call(q, &["a", "b"])), "foo(a, b)");
        assert_eq!(print(8, |q| call(q, &["a", "b"])), "foo(\n  a,\n  b,\n)");
    }

    #[test]
    fn test_forced_break_breaks_group() {
        let output = print(80, |q| {
            q.group(|q| {
                q.text("a");
                q.breakable_space();
                q.text("b");
                q.breakable_force();
                q.text("c");
            });
        });
        assert_eq!(output, "a\nb\nc");
    }

    #[test]
    fn test_line_suffix_flushes_before_newline() {
        let output = print(80, |q| {
            q.text("x");
            q.line_suffix(COMMENT_PRIORITY, |q| q.text(" # note"));
            q.text(" = 1");
            q.breakable_force();
            q.text("y");
        });
        assert_eq!(output, "x = 1 # note\ny");
    }

    #[test]
    fn test_suffixes_flush_in_priority_order() {
        let output = print(80, |q| {
            q.text("foo(<<~EOS)");
            q.line_suffix(HEREDOC_PRIORITY, |q| {
                q.doc().push(separator());
                q.text("  body");
                q.doc().push(separator());
                q.text("EOS");
            });
            q.line_suffix(COMMENT_PRIORITY, |q| q.text(" # comment"));
            q.breakable_force();
            q.text("bar");
        });
        assert_eq!(output, "foo(<<~EOS) # comment\n  body\nEOS\nbar");
    }

    #[test]
    fn test_suffixes_flush_at_end_of_document() {
        let output = print(80, |q| {
            q.text("x");
            q.line_suffix(COMMENT_PRIORITY, |q| q.text(" # end"));
        });
        assert_eq!(output, "x # end");
    }

    #[test]
    fn test_trailing_whitespace_is_trimmed_at_newlines() {
        let output = print(80, |q| {
            q.text("a ");
            q.indent(|q| {
                q.breakable_force();
                q.breakable_force();
                q.text("b");
            });
        });
        assert_eq!(output, "a\n\n  b");
    }

    #[test]
    fn test_trim_removes_indentation() {
        let output = print(80, |q| {
            q.indent(|q| {
                q.text("x");
                q.breakable_force();
                q.trim();
                q.text("=begin");
            });
        });
        assert_eq!(output, "x\n=begin");
    }

    #[test]
    fn test_fill_breaks_only_where_needed() {
        let output = print(12, |q| {
            q.group(|q| {
                for (index, word) in ["aaa", "bbb", "ccc", "ddd"].iter().enumerate() {
                    if index > 0 {
                        q.fill_breakable();
                    }
                    q.text(*word);
                }
            });
        });
        assert_eq!(output, "aaa bbb ccc\nddd");
    }

    #[test]
    fn test_wide_characters_count_double() {
        let output = print(8, |q| call(q, &["世界"]));
        assert_eq!(output, "foo(\n  世界,\n)");
    }
}
