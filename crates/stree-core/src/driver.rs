//! Entry points that take source text to a tree, a document or formatted text
//!
//! Parsing and formatting recurse once per nesting level. Both run on a
//! dedicated thread with a large stack so deeply nested input reaches the
//! parser's depth limit instead of overflowing.

use crate::cst::dump;
use crate::cst::format_element::debug_document;
use crate::cst::formatter::{self, FormatOptions};
use crate::cst::node::Node;
use crate::cst::parser;
use crate::error::{ParseError, StreeError};
use crate::result::Result;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, trace, warn};

/// Stack given to the parsing and formatting thread
const STACK_SIZE: usize = 256 * 1024 * 1024;

/// Run `work` on a thread with [`STACK_SIZE`] bytes of stack
fn on_large_stack<T: Send>(
    work: impl FnOnce() -> std::result::Result<T, ParseError> + Send,
) -> std::result::Result<T, ParseError> {
    std::thread::scope(|scope| {
        let handle = std::thread::Builder::new()
            .name("stree-worker".to_string())
            .stack_size(STACK_SIZE)
            .spawn_scoped(scope, work)
            .map_err(|e| {
                warn!("Failed to spawn worker thread: {}", e);
                ParseError::new(format!("cannot start parser thread: {e}"), 1, 0)
            })?;
        handle
            .join()
            .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
    })
}

/// Source text without a leading byte order mark
fn without_bom(source: &str) -> &str {
    source.strip_prefix('\u{feff}').unwrap_or(source)
}

/// Parse a program into its syntax tree
pub fn parse(source: &str) -> std::result::Result<Node, ParseError> {
    let source = without_bom(source);
    let started = std::time::Instant::now();
    let result = on_large_stack(|| parser::parse(source));
    match &result {
        Ok(_) => trace!("Parsed {} bytes in {:?}", source.len(), started.elapsed()),
        Err(err) => debug!("Parse failed: {}", err),
    }
    result
}

/// Format a program with the default options
pub fn format(source: &str) -> std::result::Result<String, ParseError> {
    format_with(source, &FormatOptions::default())
}

/// Format a program with the given options
pub fn format_with(source: &str, options: &FormatOptions) -> std::result::Result<String, ParseError> {
    let source = without_bom(source);
    on_large_stack(|| {
        let program = parser::parse(source)?;
        Ok(formatter::format_program(&program, source, options))
    })
}

/// Format and confirm the output is stable under a second pass
///
/// `path` only labels the error.
pub fn format_checked(source: &str, options: &FormatOptions, path: &Path) -> Result<String> {
    let formatted = format_with(source, options)?;
    let again = format_with(&formatted, options)?;
    if again != formatted {
        warn!("Formatting of {} is not idempotent", path.display());
        return Err(StreeError::NotIdempotent {
            path: path.to_path_buf(),
        });
    }
    Ok(formatted)
}

/// Indented rendering of the layout document, for debugging the formatter
pub fn document(source: &str, options: &FormatOptions) -> std::result::Result<String, ParseError> {
    let source = without_bom(source);
    on_large_stack(|| {
        let program = parser::parse(source)?;
        let elements = formatter::build_document(&program, source, options);
        Ok(debug_document(&elements))
    })
}

/// S-expression dump of the tree
pub fn sexp(source: &str, width: usize) -> std::result::Result<String, ParseError> {
    let source = without_bom(source);
    on_large_stack(|| {
        let program = parser::parse(source)?;
        Ok(dump::to_sexp(&program, width))
    })
}

/// JSON dump of the tree
pub fn json(source: &str) -> std::result::Result<serde_json::Value, ParseError> {
    let source = without_bom(source);
    on_large_stack(|| {
        let program = parser::parse(source)?;
        Ok(dump::to_json(&program))
    })
}

/// Encodings read as UTF-8; the last two may hold arbitrary bytes
const UTF8_COMPATIBLE: &[&str] = &["utf-8", "utf8", "us-ascii", "ascii", "ascii-8bit", "binary"];

fn magic_comment() -> Option<&'static Regex> {
    static MAGIC: OnceLock<Option<Regex>> = OnceLock::new();
    MAGIC
        .get_or_init(|| Regex::new(r"^#.*?coding\s*[:=]\s*([A-Za-z0-9_.-]+)").ok())
        .as_ref()
}

/// Encoding named by a magic comment on the first line, or on the second
/// line when the first is a shebang
pub fn declared_encoding(source: &str) -> Option<String> {
    let regex = magic_comment()?;
    let mut lines = source.lines();
    let first = lines.next()?;
    let candidate = if first.starts_with("#!") {
        lines.next()?
    } else {
        first
    };
    regex
        .captures(candidate)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str().to_string())
}

/// Decode raw file contents, honoring a UTF-8 byte order mark and a magic
/// encoding comment
pub fn decode(bytes: &[u8], path: &Path) -> Result<String> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let text = String::from_utf8_lossy(bytes);

    let binary = match declared_encoding(&text) {
        None => false,
        Some(encoding) => {
            let lower = encoding.to_ascii_lowercase();
            if !UTF8_COMPATIBLE.contains(&lower.as_str()) {
                return Err(StreeError::Encoding {
                    encoding,
                    path: path.to_path_buf(),
                });
            }
            matches!(lower.as_str(), "ascii-8bit" | "binary")
        }
    };

    match std::str::from_utf8(bytes) {
        Ok(valid) => Ok(valid.to_string()),
        Err(_) if binary => Ok(text.into_owned()),
        Err(e) => Err(StreeError::io_error(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        )),
    }
}

/// Read a source file
pub fn read(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| StreeError::io_error(path, e))?;
    debug!("Read {} ({} bytes)", path.display(), bytes.len());
    decode(&bytes, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn path() -> PathBuf {
        PathBuf::from("test.rb")
    }

    #[test]
    fn formats_with_defaults() {
        assert_eq!(format("x=1").unwrap(), "x = 1\n");
    }

    #[test]
    fn reports_parse_errors() {
        let err = format("def foo(").unwrap_err();
        assert!(err.line >= 1);
    }

    #[test]
    fn byte_order_marks_are_dropped() {
        assert_eq!(format("\u{feff}# c\nx=1").unwrap(), "# c\nx = 1\n");
        assert_eq!(parse("\u{feff}x").unwrap().start_char(), 0);
        assert!(!sexp("\u{feff}x", 80).unwrap().contains('\u{feff}'));
    }

    #[test]
    fn detects_magic_comments() {
        assert_eq!(declared_encoding("# encoding: utf-8\nx"), Some("utf-8".to_string()));
        assert_eq!(
            declared_encoding("#!/usr/bin/env ruby\n# -*- coding: binary -*-\n"),
            Some("binary".to_string())
        );
        assert_eq!(declared_encoding("x = 1\n# encoding: utf-8\n"), None);
    }

    #[test]
    fn decodes_compatible_encodings() {
        assert_eq!(decode(b"\xEF\xBB\xBFx = 1\n", &path()).unwrap(), "x = 1\n");
        let binary = decode(b"# encoding: ASCII-8BIT\n\"\xFF\"\n", &path()).unwrap();
        assert!(binary.contains('\u{FFFD}'));
        assert!(decode(b"\"\xFF\"\n", &path()).is_err());
    }

    #[test]
    fn rejects_other_encodings() {
        let err = decode(b"# encoding: Shift_JIS\nx\n", &path()).unwrap_err();
        assert!(matches!(err, StreeError::Encoding { ref encoding, .. } if encoding == "Shift_JIS"));
    }

    #[test]
    fn checked_formatting_is_stable() {
        let output = format_checked("foo(1,2)", &FormatOptions::default(), &path()).unwrap();
        assert_eq!(output, "foo(1, 2)\n");
    }

    #[test]
    fn dumps_documents() {
        let doc = document("x", &FormatOptions::default()).unwrap();
        assert!(doc.contains("text \"x\""));
    }
}
