//! Concrete syntax tree for Ruby
//!
//! Source text flows through four stages:
//!
//! - **Tokenizer** ([`lexer`]): a pull lexer that tracks enough Ruby lexer
//!   state to tell regexps from division, hash braces from block braces and
//!   heredocs from shifts.
//! - **Grammar driver** ([`parser`]): recursive descent that feeds every
//!   consumed token into the [`builder`].
//! - **Tree builder** ([`builder`], [`ledger`], [`comments`]): builds typed
//!   [`node::Node`]s with exact character locations and attaches comments.
//! - **Formatter** ([`formatter`], [`format_element`], [`printer`]): lowers
//!   the tree into a layout document and prints it within a line width.
//!
//! ## Example
//!
//! ```rust,ignore
//! use stree_core::cst::{formatter, parser};
//!
//! let source = "foo(1,2) # call\n";
//! let program = parser::parse(source)?;
//! assert_eq!(program.type_name(), "program");
//!
//! let output = formatter::format_program(&program, source, &Default::default());
//! assert_eq!(output, "foo(1, 2) # call\n");
//! ```

pub mod builder;
pub mod comments;
pub mod dump;
pub mod format_element;
pub mod formatter;
pub mod ledger;
pub mod lexer;
pub mod location;
pub mod node;
pub mod parser;
pub mod printer;
pub mod token;
pub mod visitor;

pub use format_element::{DocBuilder, FormatElement, Layout};
pub use formatter::{FormatOptions, Formatter};
pub use location::{Location, SourceIndex};
pub use node::{Comment, Node, NodeKind, NodeTag};
pub use printer::{Printer, PrinterOptions};
