//! Pending scanner tokens waiting to be claimed by a production
//!
//! Keywords, operators, punctuation and string delimiters do not become
//! nodes on their own. The scanner records them here and the production that
//! owns them claims them later to compute its bounds. Searches start at the
//! most recent entry, so when several candidates match the innermost (most
//! recently scanned) one wins.

use super::token::{Token, TokenKind};
use crate::error::ParseError;

#[derive(Debug, Default)]
pub struct TokenLedger {
    entries: Vec<Token>,
    /// Position reported when a lookup misses: `(line, char column)`
    position: (usize, usize),
}

impl TokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, token: Token) {
        self.entries.push(token);
    }

    /// Update the position used for miss errors
    pub fn set_position(&mut self, line: usize, column: usize) {
        self.position = (line, column);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the rightmost entry of `kind` (and `value`, when given),
    /// removing it when `consume` is set
    pub fn find(
        &mut self,
        kind: TokenKind,
        value: Option<&str>,
        consume: bool,
    ) -> Result<Token, ParseError> {
        let index = self.index_of(kind, value).ok_or_else(|| {
            let (line, column) = self.position;
            let expected = match value {
                Some(value) => format!("{kind} '{value}'"),
                None => kind.to_string(),
            };
            ParseError::new(format!("Cannot find expected {expected}"), line, column)
        })?;

        Ok(if consume {
            self.entries.remove(index)
        } else {
            self.entries[index].clone()
        })
    }

    /// Claim a matching entry, if any
    pub fn take(&mut self, kind: TokenKind, value: Option<&str>) -> Option<Token> {
        self.index_of(kind, value)
            .map(|index| self.entries.remove(index))
    }

    pub fn peek(&self, kind: TokenKind, value: Option<&str>) -> Option<&Token> {
        self.index_of(kind, value).map(|index| &self.entries[index])
    }

    /// Rightmost match that starts at or after `(line, column)`, bounded so
    /// that a production does not steal a token scanned before its own start
    pub fn take_after(
        &mut self,
        kind: TokenKind,
        value: Option<&str>,
        line: usize,
        column: usize,
    ) -> Option<Token> {
        let index = self.entries.iter().rposition(|token| {
            token.kind == kind
                && value.is_none_or(|value| token.value == value)
                && (token.line, token.column) >= (line, column)
        })?;
        Some(self.entries.remove(index))
    }

    /// Rightmost match that starts before `(line, column)`
    pub fn take_before(
        &mut self,
        kind: TokenKind,
        value: Option<&str>,
        line: usize,
        column: usize,
    ) -> Option<Token> {
        let index = self.entries.iter().rposition(|token| {
            token.kind == kind
                && value.is_none_or(|value| token.value == value)
                && (token.line, token.column) < (line, column)
        })?;
        Some(self.entries.remove(index))
    }

    fn index_of(&self, kind: TokenKind, value: Option<&str>) -> Option<usize> {
        self.entries
            .iter()
            .rposition(|token| token.kind == kind && value.is_none_or(|value| token.value == value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(value: &str, column: usize) -> Token {
        Token::new(TokenKind::Kw, value, 1, column)
    }

    #[test]
    fn rightmost_match_wins() {
        let mut ledger = TokenLedger::new();
        ledger.record(kw("end", 0));
        ledger.record(kw("do", 4));
        ledger.record(kw("end", 8));

        let token = ledger.find(TokenKind::Kw, Some("end"), true).unwrap();
        assert_eq!(token.column, 8);
        assert_eq!(ledger.len(), 2);

        let token = ledger.find(TokenKind::Kw, Some("end"), false).unwrap();
        assert_eq!(token.column, 0);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn any_value_matches_by_kind() {
        let mut ledger = TokenLedger::new();
        ledger.record(Token::new(TokenKind::Op, "+", 1, 2));
        ledger.record(kw("if", 4));

        let op = ledger.find(TokenKind::Op, None, true).unwrap();
        assert_eq!(op.value, "+");
        assert!(ledger.peek(TokenKind::Op, None).is_none());
    }

    #[test]
    fn misses_report_the_expected_kind() {
        let mut ledger = TokenLedger::new();
        ledger.set_position(3, 7);
        let err = ledger.find(TokenKind::RParen, None, true).unwrap_err();
        assert_eq!(err.message, "Cannot find expected rparen");
        assert_eq!((err.line, err.column), (3, 7));

        let err = ledger.find(TokenKind::Kw, Some("end"), true).unwrap_err();
        assert_eq!(err.message, "Cannot find expected keyword 'end'");
    }

    #[test]
    fn bounded_lookups_respect_positions() {
        let mut ledger = TokenLedger::new();
        ledger.record(kw("do", 2));
        ledger.record(kw("do", 10));

        assert!(ledger.take_after(TokenKind::Kw, Some("do"), 1, 11).is_none());
        let early = ledger.take_before(TokenKind::Kw, Some("do"), 1, 5).unwrap();
        assert_eq!(early.column, 2);
        assert!(ledger.take(TokenKind::Kw, Some("do")).is_some());
        assert!(ledger.is_empty());
    }
}
