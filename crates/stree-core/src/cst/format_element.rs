//! Document IR for the layout engine
//!
//! A document is a list of [`FormatElement`]s. Text is printed as is,
//! breakables turn into newlines or their flat separator depending on the
//! group they belong to, and line suffixes are held back until the next
//! newline. The [`DocBuilder`] assembles documents through the [`Layout`]
//! trait, which the formatter and the S-expression dump both implement.
//!
//! # Example
//!
//! ```rust,ignore
//! use stree_core::cst::format_element::{DocBuilder, Layout};
//!
//! let mut doc = DocBuilder::new();
//! doc.group(|q| {
//!     q.text("foo(");
//!     q.indent(|q| {
//!         q.breakable_empty();
//!         q.text("bar");
//!     });
//!     q.breakable_empty();
//!     q.text(")");
//! });
//! let elements = doc.finish();
//! ```

use std::fmt::Write as _;
use unicode_width::UnicodeWidthStr;

/// Trailing comments flush first at a newline
pub const COMMENT_PRIORITY: u8 = 1;
/// Heredoc bodies flush after trailing comments
pub const HEREDOC_PRIORITY: u8 = 2;

/// Whether a group has been forced to break
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupMode {
    /// Decided by the printer from the available width
    Unresolved,
    /// Contains a forced break
    Broken,
    /// Always printed on one line
    Flat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatElement {
    /// Literal text and its display width
    Text { text: Box<str>, width: usize },

    /// A newline in a broken group, `separator` in a flat one
    Breakable {
        separator: &'static str,
        width: usize,
        /// Indent the following line; heredoc bodies start at column 0
        indent: bool,
        /// Always a newline, even inside a flat group
        force: bool,
    },

    /// Contents printed flat if they fit, broken otherwise
    Group {
        id: usize,
        mode: GroupMode,
        contents: Vec<FormatElement>,
    },

    Indent(Vec<FormatElement>),

    /// Shift the indentation by a fixed number of columns, possibly
    /// negative to outdent clause keywords
    Align { width: isize, contents: Vec<FormatElement> },

    /// Contents chosen by the mode of the enclosing group
    IfBreak {
        break_contents: Vec<FormatElement>,
        flat_contents: Vec<FormatElement>,
    },

    /// Deferred until the next newline, lowest priority first
    LineSuffix {
        priority: u8,
        contents: Vec<FormatElement>,
    },

    /// Breaks every enclosing group
    BreakParent,

    /// Removes trailing whitespace from the current line
    Trim,
}

impl FormatElement {
    /// Whether printing this element produces no output
    pub fn is_empty(&self) -> bool {
        match self {
            FormatElement::Text { text, .. } => text.is_empty(),
            FormatElement::Breakable { .. } => false,
            FormatElement::Group { contents, .. }
            | FormatElement::Indent(contents)
            | FormatElement::Align { contents, .. }
            | FormatElement::LineSuffix { contents, .. } => {
                contents.iter().all(FormatElement::is_empty)
            }
            FormatElement::IfBreak {
                break_contents,
                flat_contents,
            } => {
                break_contents.iter().all(FormatElement::is_empty)
                    && flat_contents.iter().all(FormatElement::is_empty)
            }
            FormatElement::BreakParent | FormatElement::Trim => true,
        }
    }
}

/// Create a text element
pub fn text(value: impl Into<String>) -> FormatElement {
    let value: String = value.into();
    FormatElement::Text {
        width: value.width(),
        text: value.into_boxed_str(),
    }
}

/// A space when flat, a newline when broken
pub fn breakable_space() -> FormatElement {
    FormatElement::Breakable {
        separator: " ",
        width: 1,
        indent: true,
        force: false,
    }
}

/// Nothing when flat, a newline when broken
pub fn breakable_empty() -> FormatElement {
    FormatElement::Breakable {
        separator: "",
        width: 0,
        indent: true,
        force: false,
    }
}

/// A newline that does not break enclosing groups and starts at column 0
///
/// Heredoc bodies are written with it so that the group around the opener
/// can stay flat.
pub fn separator() -> FormatElement {
    FormatElement::Breakable {
        separator: " ",
        width: 1,
        indent: false,
        force: true,
    }
}

pub fn group(contents: Vec<FormatElement>) -> FormatElement {
    FormatElement::Group {
        id: 0,
        mode: GroupMode::Unresolved,
        contents,
    }
}

pub fn indent(contents: Vec<FormatElement>) -> FormatElement {
    FormatElement::Indent(contents)
}

pub fn line_suffix(priority: u8, contents: Vec<FormatElement>) -> FormatElement {
    FormatElement::LineSuffix { priority, contents }
}

#[derive(Debug)]
enum FrameKind {
    Root,
    Group { id: usize, broken: bool, flat: bool },
    Indent,
    Align(isize),
    LineSuffix(u8),
    /// Collected for the caller, as for `IfBreak` branches
    Contents,
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    contents: Vec<FormatElement>,
}

/// Incrementally builds a document
///
/// Containers are opened and closed in stack order. A forced break marks
/// every group that is open at that moment as broken, so break propagation
/// is settled before printing starts.
#[derive(Debug)]
pub struct DocBuilder {
    frames: Vec<Frame>,
    next_group_id: usize,
}

impl Default for DocBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocBuilder {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame {
                kind: FrameKind::Root,
                contents: Vec::new(),
            }],
            next_group_id: 1,
        }
    }

    pub fn push(&mut self, element: FormatElement) {
        if let Some(frame) = self.frames.last_mut() {
            frame.contents.push(element);
        }
    }

    fn open(&mut self, kind: FrameKind) {
        self.frames.push(Frame {
            kind,
            contents: Vec::new(),
        });
    }

    fn open_group(&mut self, flat: bool) -> usize {
        let id = self.next_group_id;
        self.next_group_id += 1;
        self.open(FrameKind::Group {
            id,
            broken: false,
            flat,
        });
        id
    }

    /// Close the innermost container and add it to its parent
    fn close(&mut self) {
        if self.frames.len() <= 1 {
            return;
        }
        let Some(frame) = self.frames.pop() else {
            return;
        };
        let element = match frame.kind {
            FrameKind::Group { id, broken, flat } => FormatElement::Group {
                id,
                mode: if flat {
                    GroupMode::Flat
                } else if broken {
                    GroupMode::Broken
                } else {
                    GroupMode::Unresolved
                },
                contents: frame.contents,
            },
            FrameKind::Indent => FormatElement::Indent(frame.contents),
            FrameKind::Align(width) => FormatElement::Align {
                width,
                contents: frame.contents,
            },
            FrameKind::LineSuffix(priority) => FormatElement::LineSuffix {
                priority,
                contents: frame.contents,
            },
            FrameKind::Root | FrameKind::Contents => {
                for element in frame.contents {
                    self.push(element);
                }
                return;
            }
        };
        self.push(element);
    }

    /// Close a `Contents` frame and hand its elements back
    fn take_contents(&mut self) -> Vec<FormatElement> {
        match self.frames.last() {
            Some(Frame {
                kind: FrameKind::Contents,
                ..
            }) => self
                .frames
                .pop()
                .map(|frame| frame.contents)
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// Break every open group up to the nearest flat one
    pub fn break_parent(&mut self) {
        for frame in self.frames.iter_mut().rev() {
            if let FrameKind::Group { broken, flat, .. } = &mut frame.kind {
                if *flat {
                    break;
                }
                *broken = true;
            }
        }
        self.push(FormatElement::BreakParent);
    }

    /// Whether the innermost open group is already broken
    pub fn in_broken_group(&self) -> bool {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| match frame.kind {
                FrameKind::Group { broken, .. } => Some(broken),
                _ => None,
            })
            .unwrap_or(false)
    }

    /// Close anything left open and return the document
    pub fn finish(mut self) -> Vec<FormatElement> {
        while self.frames.len() > 1 {
            self.close();
        }
        self.frames
            .pop()
            .map(|frame| frame.contents)
            .unwrap_or_default()
    }
}

/// Layout primitives on top of a [`DocBuilder`]
///
/// Container methods take a closure that fills the container, so the
/// nesting of the document follows the nesting of the code building it.
pub trait Layout: Sized {
    fn doc(&mut self) -> &mut DocBuilder;

    fn text(&mut self, value: impl AsRef<str>) {
        let value = value.as_ref();
        if !value.is_empty() {
            self.doc().push(text(value));
        }
    }

    fn breakable_space(&mut self) {
        self.doc().push(breakable_space());
    }

    fn breakable_empty(&mut self) {
        self.doc().push(breakable_empty());
    }

    /// A newline that also breaks every enclosing group
    fn breakable_force(&mut self) {
        self.doc().push(FormatElement::Breakable {
            separator: " ",
            width: 1,
            indent: true,
            force: true,
        });
        self.doc().break_parent();
    }

    /// A forced newline back to column 0
    fn breakable_return(&mut self) {
        self.doc().push(FormatElement::Breakable {
            separator: " ",
            width: 1,
            indent: false,
            force: true,
        });
        self.doc().break_parent();
    }

    /// `separator` inside its own group, so that it breaks only when the
    /// next item does not fit
    fn fill_breakable(&mut self) {
        self.group(|q| q.breakable_space());
    }

    fn break_parent(&mut self) {
        self.doc().break_parent();
    }

    fn trim(&mut self) {
        self.doc().push(FormatElement::Trim);
    }

    fn group(&mut self, contents: impl FnOnce(&mut Self)) -> usize {
        let id = self.doc().open_group(false);
        contents(self);
        self.doc().close();
        id
    }

    /// A group that never breaks; forced breaks inside it stay contained
    fn flat_group(&mut self, contents: impl FnOnce(&mut Self)) -> usize {
        let id = self.doc().open_group(true);
        contents(self);
        self.doc().close();
        id
    }

    fn indent(&mut self, contents: impl FnOnce(&mut Self)) {
        self.doc().open(FrameKind::Indent);
        contents(self);
        self.doc().close();
    }

    fn nest(&mut self, width: isize, contents: impl FnOnce(&mut Self)) {
        self.doc().open(FrameKind::Align(width));
        contents(self);
        self.doc().close();
    }

    fn line_suffix(&mut self, priority: u8, contents: impl FnOnce(&mut Self)) {
        self.doc().open(FrameKind::LineSuffix(priority));
        contents(self);
        self.doc().close();
    }

    fn if_break(&mut self, on_break: impl FnOnce(&mut Self), on_flat: impl FnOnce(&mut Self)) {
        self.doc().open(FrameKind::Contents);
        on_break(self);
        let break_contents = self.doc().take_contents();
        self.doc().open(FrameKind::Contents);
        on_flat(self);
        let flat_contents = self.doc().take_contents();
        self.doc().push(FormatElement::IfBreak {
            break_contents,
            flat_contents,
        });
    }

    /// Contents only when the enclosing group breaks
    fn if_broken(&mut self, contents: impl FnOnce(&mut Self)) {
        self.if_break(contents, |_| {});
    }

    /// Contents only when the enclosing group stays flat
    fn if_flat(&mut self, contents: impl FnOnce(&mut Self)) {
        self.if_break(|_| {}, contents);
    }

    /// Build a detached list of elements without touching the current container
    fn capture(&mut self, contents: impl FnOnce(&mut Self)) -> Vec<FormatElement> {
        self.doc().open(FrameKind::Contents);
        contents(self);
        self.doc().take_contents()
    }
}

impl Layout for DocBuilder {
    fn doc(&mut self) -> &mut DocBuilder {
        self
    }
}

/// Column reached after printing `elements` flat from column 0
pub fn flat_width(elements: &[FormatElement]) -> usize {
    let mut width = 0;
    for element in elements {
        match element {
            FormatElement::Text { text, width: size } => {
                width = match text.rfind('\n') {
                    Some(index) => text[index + 1..].width(),
                    None => width + size,
                };
            }
            FormatElement::Breakable {
                width: size, force, ..
            } => {
                width = if *force { 0 } else { width + size };
            }
            FormatElement::Group { contents, .. }
            | FormatElement::Indent(contents)
            | FormatElement::Align { contents, .. } => {
                let inner = flat_width(contents);
                width = if contains_newline(contents) {
                    inner
                } else {
                    width + inner
                };
            }
            FormatElement::IfBreak { flat_contents, .. } => {
                width += flat_width(flat_contents);
            }
            FormatElement::LineSuffix { .. }
            | FormatElement::BreakParent
            | FormatElement::Trim => {}
        }
    }
    width
}

fn contains_newline(elements: &[FormatElement]) -> bool {
    elements.iter().any(|element| match element {
        FormatElement::Text { text, .. } => text.contains('\n'),
        FormatElement::Breakable { force, .. } => *force,
        FormatElement::Group { contents, .. }
        | FormatElement::Indent(contents)
        | FormatElement::Align { contents, .. } => contains_newline(contents),
        _ => false,
    })
}

/// Render a document as an indented tree, for the `doc` command
pub fn debug_document(elements: &[FormatElement]) -> String {
    let mut out = String::new();
    for element in elements {
        write_debug(&mut out, element, 0);
    }
    out
}

fn write_debug(out: &mut String, element: &FormatElement, depth: usize) {
    let pad = "  ".repeat(depth);
    let children = |out: &mut String, name: &str, contents: &[FormatElement]| {
        let _ = writeln!(out, "{pad}{name}");
        for child in contents {
            write_debug(out, child, depth + 1);
        }
    };
    match element {
        FormatElement::Text { text, .. } => {
            let _ = writeln!(out, "{pad}text {text:?}");
        }
        FormatElement::Breakable {
            separator,
            indent,
            force,
            ..
        } => {
            let kind = match (force, indent) {
                (true, true) => "breakable force",
                (true, false) => "breakable return",
                (false, _) if separator.is_empty() => "breakable empty",
                (false, _) => "breakable space",
            };
            let _ = writeln!(out, "{pad}{kind}");
        }
        FormatElement::Group { mode, contents, .. } => {
            let name = match mode {
                GroupMode::Broken => "group (broken)",
                _ => "group",
            };
            children(out, name, contents);
        }
        FormatElement::Indent(contents) => children(out, "indent", contents),
        FormatElement::Align { width, contents } => {
            children(out, &format!("align {width}"), contents);
        }
        FormatElement::IfBreak {
            break_contents,
            flat_contents,
        } => {
            children(out, "if-break", break_contents);
            children(out, "if-flat", flat_contents);
        }
        FormatElement::LineSuffix { priority, contents } => {
            children(out, &format!("line-suffix {priority}"), contents);
        }
        FormatElement::BreakParent => {
            let _ = writeln!(out, "{pad}break-parent");
        }
        FormatElement::Trim => {
            let _ = writeln!(out, "{pad}trim");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_measures_display_width() {
        assert_eq!(
            text("世界"),
            FormatElement::Text {
                text: "世界".into(),
                width: 4
            }
        );
    }

    #[test]
    fn forced_breaks_break_every_open_group() {
        let mut doc = DocBuilder::new();
        doc.group(|q| {
            q.text("a");
            q.group(|q| {
                q.breakable_force();
            });
        });
        q_assert_broken(&doc.finish());
    }

    fn q_assert_broken(elements: &[FormatElement]) {
        let FormatElement::Group { mode, contents, .. } = &elements[0] else {
            panic!("expected a group");
        };
        assert_eq!(*mode, GroupMode::Broken);
        let FormatElement::Group { mode, .. } = &contents[1] else {
            panic!("expected a nested group");
        };
        assert_eq!(*mode, GroupMode::Broken);
    }

    #[test]
    fn if_break_collects_both_branches() {
        let mut doc = DocBuilder::new();
        doc.group(|q| {
            q.if_break(|q| q.text(","), |_| {});
        });
        let elements = doc.finish();
        let FormatElement::Group { contents, .. } = &elements[0] else {
            panic!("expected a group");
        };
        assert_eq!(
            contents[0],
            FormatElement::IfBreak {
                break_contents: vec![text(",")],
                flat_contents: vec![],
            }
        );
    }

    #[test]
    fn flat_groups_contain_forced_breaks() {
        let mut doc = DocBuilder::new();
        doc.group(|q| {
            q.flat_group(|q| q.breakable_force());
        });
        let elements = doc.finish();
        let FormatElement::Group { mode, contents, .. } = &elements[0] else {
            panic!("expected a group");
        };
        assert_eq!(*mode, GroupMode::Unresolved);
        assert!(matches!(
            contents[0],
            FormatElement::Group {
                mode: GroupMode::Flat,
                ..
            }
        ));
    }

    #[test]
    fn flat_width_measures_to_the_last_line() {
        let mut doc = DocBuilder::new();
        doc.text("foo");
        doc.group(|q| {
            q.text(".");
            q.breakable_empty();
            q.text("bar");
        });
        assert_eq!(flat_width(&doc.finish()), 7);

        let mut doc = DocBuilder::new();
        doc.text("long line");
        doc.breakable_force();
        doc.text("ab");
        assert_eq!(flat_width(&doc.finish()), 2);
    }

    #[test]
    fn empty_text_is_skipped() {
        let mut doc = DocBuilder::new();
        doc.text("");
        assert!(doc.finish().is_empty());
    }

    #[test]
    fn debug_output_is_indented() {
        let mut doc = DocBuilder::new();
        doc.group(|q| {
            q.text("x");
            q.breakable_space();
        });
        assert_eq!(
            debug_document(&doc.finish()),
            "group\n  text \"x\"\n  breakable space\n"
        );
    }
}
