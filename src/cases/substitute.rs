//! Placeholder substitution for case documents
//!
//! Supports `${name}` and `$name` references plus `$$` for a literal dollar
//! sign. Every reference must resolve; anything else is a load error.

use std::collections::HashMap;

use crate::common::config::Config;
use crate::common::{Error, Result};

/// Variables available to case documents
#[derive(Debug, Clone, Default)]
pub struct Variables {
    values: HashMap<String, String>,
}

impl Variables {
    /// The `host` and `token` variables taken from the configuration
    pub fn from_config(config: &Config) -> Self {
        let mut vars = Self::default();
        vars.insert("host", &config.environment.host);
        vars.insert("token", &config.environment.token);
        vars
    }

    pub fn insert(&mut self, name: &str, value: &str) {
        self.values.insert(name.to_string(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

fn is_ident_char(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

/// Replace every placeholder in `input`
pub fn substitute(input: &str, vars: &Variables) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut line = 1;
    let mut column = 0;

    while let Some(c) = chars.next() {
        column += 1;
        if c == '\n' {
            line += 1;
            column = 0;
        }
        if c != '$' {
            out.push(c);
            continue;
        }

        let start_column = column;
        match chars.peek().copied() {
            Some('$') => {
                chars.next();
                column += 1;
                out.push('$');
            }
            Some('{') => {
                chars.next();
                column += 1;
                let mut name = String::new();
                let mut closed = false;
                while let Some(&next) = chars.peek() {
                    chars.next();
                    column += 1;
                    if next == '}' {
                        closed = true;
                        break;
                    }
                    name.push(next);
                }
                let valid = closed
                    && name.chars().next().is_some_and(is_ident_start)
                    && name.chars().all(is_ident_char);
                if !valid {
                    return Err(Error::InvalidPlaceholder {
                        line,
                        column: start_column,
                    });
                }
                out.push_str(resolve(&name, vars, line)?);
            }
            Some(next) if is_ident_start(next) => {
                let mut name = String::new();
                while let Some(&next) = chars.peek() {
                    if !is_ident_char(next) {
                        break;
                    }
                    chars.next();
                    column += 1;
                    name.push(next);
                }
                out.push_str(resolve(&name, vars, line)?);
            }
            _ => {
                return Err(Error::InvalidPlaceholder {
                    line,
                    column: start_column,
                })
            }
        }
    }

    Ok(out)
}

fn resolve<'a>(name: &str, vars: &'a Variables, line: usize) -> Result<&'a str> {
    vars.get(name).ok_or_else(|| Error::UnresolvedPlaceholder {
        name: name.to_string(),
        line,
    })
}
