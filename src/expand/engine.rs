// envstack: Layered Environment Variable Stores
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Built-in parameter expansion engine.
//!
//! ```text
//! $NAME ${NAME}          value, or "" if unset
//! $0..$9 $# ${10}        positional parameters, stored as "$1", "$#", ...
//! ${NAME:-word}          word if NAME is unset or empty
//! ${NAME:=word}          as :- and assigns word to NAME
//! ${NAME:+word}          word if NAME is set and non-empty, else ""
//! ${NAME:?word}          error if NAME is unset or empty
//! ${NAME-word} ...       same four without ':' only test for unset
//! ${#NAME}               length of the value in characters
//! ${!PREFIX*} ${!PREFIX@} names starting with PREFIX, space separated
//! ~ ~user                home directory, at the start of a word
//! \$ \~ \\               literal character
//! ```
//!
//! Operator words are expanded only when they are used. Assignments made
//! by `:=` are visible to the rest of the input at once but reach the store
//! only after the whole input expanded without error.

use super::{ExpandError, ExpansionCallbacks, Expander};

const UNSET_MESSAGE: &str = "parameter null or not set";

/// A subset of POSIX shell parameter expansion.
///
/// No word splitting, globbing, quoting or command substitution takes
/// place; the output is always a single string.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellExpander;

impl ShellExpander {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Expander for ShellExpander {
    fn expand(
        &self,
        input: &str,
        callbacks: &mut dyn ExpansionCallbacks,
    ) -> Result<String, ExpandError> {
        if !input.contains(['$', '~', '\\']) {
            return Ok(input.to_owned());
        }
        let mut parser = Parser::new(input, callbacks);
        let out = parser.word(false)?;
        parser.commit()?;
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Default,
    Assign,
    Alternate,
    Error,
}

impl Operator {
    const fn from_char(c: char) -> Option<Self> {
        match c {
            '-' => Some(Self::Default),
            '=' => Some(Self::Assign),
            '+' => Some(Self::Alternate),
            '?' => Some(Self::Error),
            _ => None,
        }
    }
}

struct Parser<'i, 'c> {
    input: &'i str,
    pos: usize,
    callbacks: &'c mut dyn ExpansionCallbacks,
    /// `:=` assignments not yet written, in order.
    pending: Vec<(String, String)>,
}

impl<'i, 'c> Parser<'i, 'c> {
    fn new(input: &'i str, callbacks: &'c mut dyn ExpansionCallbacks) -> Self {
        Self {
            input,
            pos: 0,
            callbacks,
            pending: Vec::new(),
        }
    }

    fn lookup(&self, key: &str) -> Option<String> {
        self.pending
            .iter()
            .rev()
            .find(|(pending, _)| pending == key)
            .map(|(_, value)| value.clone())
            .or_else(|| self.callbacks.lookup_var(key))
    }

    fn match_names(&self, prefix: &str) -> Vec<String> {
        let mut names = self.callbacks.match_var_names(prefix);
        for (key, _) in &self.pending {
            if key.starts_with(prefix) && !names.contains(key) {
                names.push(key.clone());
            }
        }
        names
    }

    fn commit(&mut self) -> Result<(), ExpandError> {
        for (key, value) in std::mem::take(&mut self.pending) {
            self.callbacks.assign_var(&key, &value)?;
        }
        Ok(())
    }

    fn rest(&self) -> &'i str {
        self.input.get(self.pos..).unwrap_or_default()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'i str {
        let rest = self.rest();
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += len;
        rest.get(..len).unwrap_or_default()
    }

    /// Expands up to the end of input, or up to the `}` closing the
    /// enclosing `${` when `nested`. The `}` is left for the caller.
    fn word(&mut self, nested: bool) -> Result<String, ExpandError> {
        let mut out = String::new();
        let mut at_word_start = true;

        loop {
            let Some(c) = self.peek() else {
                if nested {
                    return Err(ExpandError::Unterminated);
                }
                return Ok(out);
            };

            match c {
                '}' if nested => return Ok(out),
                '\\' => {
                    self.bump();
                    match self.bump() {
                        Some(escaped @ ('$' | '~' | '\\')) => out.push(escaped),
                        Some('}') if nested => out.push('}'),
                        Some(other) => {
                            out.push('\\');
                            out.push(other);
                        }
                        None => out.push('\\'),
                    }
                }
                '$' => {
                    let start = self.pos;
                    self.bump();
                    self.dollar(start, &mut out)?;
                }
                '~' if at_word_start => {
                    self.bump();
                    self.tilde(nested, &mut out);
                }
                _ => {
                    self.bump();
                    out.push(c);
                }
            }
            at_word_start = c.is_whitespace();
        }
    }

    fn dollar(&mut self, start: usize, out: &mut String) -> Result<(), ExpandError> {
        match self.peek() {
            Some('{') => {
                self.bump();
                let value = self.braced(start)?;
                out.push_str(&value);
            }
            Some(c) if c.is_ascii_digit() || c == '#' => {
                self.bump();
                let key = format!("${c}");
                out.push_str(&self.lookup(&key).unwrap_or_default());
            }
            Some(c) if is_name_start(c) => {
                let name = self.take_while(is_name_char);
                out.push_str(&self.lookup(name).unwrap_or_default());
            }
            _ => out.push('$'),
        }
        Ok(())
    }

    /// Everything after `${`.
    fn braced(&mut self, start: usize) -> Result<String, ExpandError> {
        if self.eat('#') {
            if self.eat('}') {
                return Ok(self.lookup("$#").unwrap_or_default());
            }
            let key = self.parameter(start)?;
            self.close(start)?;
            let value = self.lookup(&key).unwrap_or_default();
            return Ok(value.chars().count().to_string());
        }

        if self.eat('!') {
            let prefix = self.take_while(is_name_char);
            if prefix.is_empty() || !matches!(self.peek(), Some('*' | '@')) {
                return Err(self.bad_substitution(start));
            }
            self.bump();
            self.close(start)?;
            return Ok(self.match_names(prefix).join(" "));
        }

        let key = self.parameter(start)?;
        let colon = self.eat(':');
        let operator = match self.peek() {
            Some('}') if !colon => {
                self.bump();
                return Ok(self.lookup(&key).unwrap_or_default());
            }
            Some(c) => match Operator::from_char(c) {
                Some(operator) => {
                    self.bump();
                    operator
                }
                None => return Err(self.bad_substitution(start)),
            },
            None => return Err(ExpandError::Unterminated),
        };

        let current = self.lookup(&key);
        let is_set = current
            .as_deref()
            .is_some_and(|value| !colon || !value.is_empty());
        let uses_word = match operator {
            Operator::Alternate => is_set,
            Operator::Default | Operator::Assign | Operator::Error => !is_set,
        };

        let word = if uses_word {
            self.word(true)?
        } else {
            self.skip_word()?;
            String::new()
        };
        self.close(start)?;

        match operator {
            Operator::Alternate => Ok(word),
            _ if is_set => Ok(current.unwrap_or_default()),
            Operator::Default => Ok(word),
            Operator::Assign => {
                if key.starts_with('$') {
                    return Err(ExpandError::BadSubstitution(self.consumed(start)));
                }
                self.pending.push((key, word.clone()));
                Ok(word)
            }
            Operator::Error => Err(ExpandError::ParameterUnset {
                name: key,
                message: if word.is_empty() {
                    UNSET_MESSAGE.to_owned()
                } else {
                    word
                },
            }),
        }
    }

    /// The key a `${...}` form refers to. Positional and special
    /// parameters keep their `$`.
    fn parameter(&mut self, start: usize) -> Result<String, ExpandError> {
        match self.peek() {
            Some(c) if c.is_ascii_digit() => {
                let digits = self.take_while(|c| c.is_ascii_digit());
                Ok(format!("${digits}"))
            }
            Some('#') => {
                self.bump();
                Ok("$#".to_owned())
            }
            Some(c) if is_name_start(c) => Ok(self.take_while(is_name_char).to_owned()),
            Some(_) => Err(self.bad_substitution(start)),
            None => Err(ExpandError::Unterminated),
        }
    }

    fn close(&mut self, start: usize) -> Result<(), ExpandError> {
        if self.eat('}') {
            return Ok(());
        }
        if self.peek().is_none() {
            return Err(ExpandError::Unterminated);
        }
        Err(self.bad_substitution(start))
    }

    /// Moves to the `}` closing the current `${` without evaluating anything.
    fn skip_word(&mut self) -> Result<(), ExpandError> {
        let mut depth = 0usize;
        loop {
            match self.peek() {
                None => return Err(ExpandError::Unterminated),
                Some('\\') => {
                    self.bump();
                    self.bump();
                }
                Some('$') if self.rest().starts_with("${") => {
                    self.pos += 2;
                    depth += 1;
                }
                Some('}') if depth == 0 => return Ok(()),
                Some('}') => {
                    self.bump();
                    depth -= 1;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    /// Consumes the rest of a malformed `${...}` and reports all of it.
    fn bad_substitution(&mut self, start: usize) -> ExpandError {
        if let Err(err) = self.skip_word() {
            return err;
        }
        self.bump();
        ExpandError::BadSubstitution(self.consumed(start))
    }

    fn consumed(&self, start: usize) -> String {
        self.input
            .get(start..self.pos)
            .unwrap_or_default()
            .to_owned()
    }

    /// Everything after a word-initial `~`.
    fn tilde(&mut self, nested: bool, out: &mut String) {
        let rest = self.rest();
        let end = rest
            .find(|c: char| c == '/' || c.is_whitespace() || (nested && c == '}'))
            .unwrap_or(rest.len());
        let user = rest.get(..end).unwrap_or_default();

        if user.contains(['$', '\\', '~']) {
            out.push('~');
            return;
        }

        self.pos += end;
        match self.callbacks.lookup_home_dir(user) {
            Some(home) => out.push_str(&home),
            None => {
                out.push('~');
                out.push_str(user);
            }
        }
    }
}

const fn is_name_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

const fn is_name_char(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}
