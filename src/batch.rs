//! Statement batches
//!
//! turso runs one statement per prepared command, so a batch is split into
//! its statements here and the caller's parameters are handed out to each of
//! them. The scanner only understands what it needs for that: quoting,
//! comments, `;` separators and parameter placeholders.

use crate::params::Params;
use crate::value::Value;

/// One statement of a batch and the placeholders it uses
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Statement<'s> {
    pub sql:        &'s str,
    /// Number of positional values the statement consumes
    pub positional: usize,
    /// Whether any positional placeholder is numbered (`?NNN`)
    pub numbered:   bool,
    /// Named placeholders as spelled in the text, prefix included
    pub named:      Vec<&'s str>,
}

/// Split `sql` into its non-empty statements
pub(crate) fn split(sql: &str) -> Vec<Statement<'_>> {
    scan(sql, true)
}

/// Placeholder census of `sql` taken as a single statement
pub(crate) fn census(sql: &str) -> Statement<'_> {
    scan(sql, false).pop().unwrap_or(Statement { sql, positional: 0, numbered: false, named: Vec::new() })
}

#[derive(Default)]
struct Pending<'s> {
    start:      usize,
    has_code:   bool,
    positional: usize,
    numbered:   usize,
    named:      Vec<&'s str>,
}

impl<'s> Pending<'s> {
    fn finish(self, sql: &'s str, end: usize, out: &mut Vec<Statement<'s>>) {
        if !self.has_code {
            return;
        }
        out.push(Statement {
            sql:        sql[self.start..end].trim(),
            positional: self.positional.max(self.numbered),
            numbered:   self.numbered > 0,
            named:      self.named,
        });
    }
}

fn is_ident(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn scan(sql: &str, split: bool) -> Vec<Statement<'_>> {
    let bytes = sql.as_bytes();
    let len = bytes.len();
    let mut out = Vec::new();
    let mut pending = Pending::default();
    let mut i = 0;

    while i < len {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();
        match b {
            b'\'' | b'"' | b'`' => {
                pending.has_code = true;
                i += 1;
                while i < len {
                    if bytes[i] == b {
                        if bytes.get(i + 1) == Some(&b) {
                            i += 2;
                            continue;
                        }
                        break;
                    }
                    i += 1;
                }
            }
            b'[' => {
                pending.has_code = true;
                while i < len && bytes[i] != b']' {
                    i += 1;
                }
            }
            b'-' if next == Some(b'-') => {
                while i < len && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if next == Some(b'*') => {
                i += 2;
                while i < len && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                    i += 1;
                }
                i += 1;
            }
            b'?' => {
                pending.has_code = true;
                let digits = i + 1;
                i = digits;
                while i < len && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                match sql[digits..i].parse::<usize>() {
                    Ok(n) => pending.numbered = pending.numbered.max(n),
                    Err(_) => pending.positional += 1,
                }
                continue;
            }
            b':' | b'@' | b'$' if next.is_some_and(|n| n.is_ascii_alphabetic() || n == b'_') => {
                pending.has_code = true;
                let start = i;
                i += 1;
                while i < len && is_ident(bytes[i]) {
                    i += 1;
                }
                let name = &sql[start..i];
                if !pending.named.contains(&name) {
                    pending.named.push(name);
                }
                continue;
            }
            b';' if split => {
                std::mem::take(&mut pending).finish(sql, i, &mut out);
                pending.start = i + 1;
            }
            b if !b.is_ascii_whitespace() => pending.has_code = true,
            _ => {}
        }
        i += 1;
    }

    pending.finish(sql, len, &mut out);
    out
}

fn bare(name: &str) -> &str {
    name.trim_start_matches([':', '@', '$'])
}

/// Named parameters renamed to the placeholders `statement` spells
///
/// Parameters the statement does not mention are dropped when `keep_unmatched`
/// is false and passed on as given otherwise.
pub(crate) fn bind_named(pairs: &[(String, Value)], statement: &Statement<'_>, keep_unmatched: bool) -> Params {
    let bound: Vec<(String, Value)> = pairs
        .iter()
        .filter_map(|(name, value)| {
            match statement.named.iter().find(|spelled| bare(spelled).eq_ignore_ascii_case(bare(name))) {
                Some(spelled) => Some((spelled.to_string(), value.clone())),
                None if keep_unmatched => Some((name.clone(), value.clone())),
                None => None,
            }
        })
        .collect();

    if bound.is_empty() { Params::None } else { Params::Named(bound) }
}

/// Hand the batch's parameters out to its statements, in order
///
/// Plain `?` placeholders consume values one after another across the batch.
/// Once any statement numbers its placeholders, numbers refer to the batch's
/// whole list and every statement is given the values from the start.
pub(crate) fn distribute(statements: &[Statement<'_>], params: Params) -> Vec<Params> {
    match params {
        Params::None => statements.iter().map(|_| Params::None).collect(),
        Params::Positional(values) if statements.len() == 1 => vec![Params::Positional(values)],
        Params::Positional(values) if statements.iter().any(|s| s.numbered) => statements
            .iter()
            .map(|s| {
                let taken: Vec<Value> = values.iter().take(s.positional).cloned().collect();
                if taken.is_empty() { Params::None } else { Params::Positional(taken) }
            })
            .collect(),
        Params::Positional(values) => {
            let mut values = values.into_iter();
            statements
                .iter()
                .map(|s| {
                    let taken: Vec<Value> = values.by_ref().take(s.positional).collect();
                    if taken.is_empty() { Params::None } else { Params::Positional(taken) }
                })
                .collect()
        }
        Params::Named(pairs) => {
            let keep_unmatched = statements.len() == 1;
            statements.iter().map(|s| bind_named(&pairs, s, keep_unmatched)).collect()
        }
    }
}
