// src/instruction/parser.rs - jcode text parser
//! Parser for the line-oriented jcode instruction format.
//!
//! Statements are separated by `;` or newlines and `#` starts a comment that
//! runs to the end of the line:
//!
//! ```text
//! S 5; P U; W -1 8.5; D 1000; P D; W 1 8.5; P U
//! H  # back to the home point
//! ```
//!
//! | statement   | instruction                          |
//! |-------------|--------------------------------------|
//! | `W <x> <y>` | `Waypoint`                           |
//! | `S <v>`     | `Speed` (units/second, `v >= 0`)     |
//! | `D <ms>`    | `Delay` (milliseconds, `ms >= 0`)    |
//! | `P U`/`P D` | `Pen`                                |
//! | `H`         | `AutoHome`                           |

use std::ops::Range;
use std::time::Duration;
use thiserror::Error;

use super::{Instruction, PenMode, Speed, Waypoint};

/// Byte range of a statement in the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JCodeSpan {
    pub range: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} (at {:?})", .span.range)]
pub struct JCodeError {
    pub message: String,
    pub span: JCodeSpan,
}

pub struct JCodeParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> JCodeParser<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    /// Parses the next statement, skipping blanks and comments.
    pub fn next_instruction(&mut self) -> Option<Result<Instruction, JCodeError>> {
        let bytes = self.src.as_bytes();
        let len = bytes.len();
        while self.pos < len {
            let start = self.pos;
            let mut end = start;
            while end < len && bytes[end] != b';' && bytes[end] != b'\n' && bytes[end] != b'#' {
                end += 1;
            }
            // Comments swallow the rest of the line
            self.pos = if end < len && bytes[end] == b'#' {
                let mut eol = end;
                while eol < len && bytes[eol] != b'\n' {
                    eol += 1;
                }
                eol
            } else {
                (end + 1).min(len)
            };

            let statement = &self.src[start..end];
            if statement.trim().is_empty() {
                continue;
            }
            let span = JCodeSpan { range: start..end };
            return Some(parse_statement(statement, span));
        }
        None
    }

    /// Parses everything, stopping at the first error.
    pub fn parse_all(mut self) -> Result<Vec<Instruction>, JCodeError> {
        let mut out = Vec::new();
        while let Some(ins) = self.next_instruction() {
            out.push(ins?);
        }
        Ok(out)
    }
}

impl Iterator for JCodeParser<'_> {
    type Item = Result<Instruction, JCodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_instruction()
    }
}

fn parse_statement(statement: &str, span: JCodeSpan) -> Result<Instruction, JCodeError> {
    let err = |message: String| JCodeError { message, span: span.clone() };
    let mut words = statement.split_whitespace();
    let Some(op) = words.next() else {
        return Err(err("Empty statement".to_string()));
    };
    let args: Vec<&str> = words.collect();
    let expect_args = |n: usize| {
        if args.len() == n {
            Ok(())
        } else {
            Err(err(format!("'{}' takes {} argument(s), got {}", op, n, args.len())))
        }
    };
    let number = |s: &str| -> Result<f64, JCodeError> {
        match s.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(err(format!("Invalid number '{}'", s))),
        }
    };

    match op.to_ascii_uppercase().as_str() {
        "W" => {
            expect_args(2)?;
            Ok(Instruction::Waypoint(Waypoint::new(number(args[0])?, number(args[1])?)))
        }
        "S" => {
            expect_args(1)?;
            let v = number(args[0])?;
            if v < 0.0 {
                return Err(err(format!("Speed must not be negative, got {}", v)));
            }
            Ok(Instruction::Speed(Speed(v)))
        }
        "D" => {
            expect_args(1)?;
            let ms = number(args[0])?;
            if ms < 0.0 {
                return Err(err(format!("Delay must not be negative, got {}", ms)));
            }
            Duration::try_from_secs_f64(ms / 1000.0)
                .map(Instruction::Delay)
                .map_err(|_| err(format!("Delay out of range, got {}", ms)))
        }
        "P" => {
            expect_args(1)?;
            match args[0].to_ascii_uppercase().as_str() {
                "U" => Ok(Instruction::Pen(PenMode::Up)),
                "D" => Ok(Instruction::Pen(PenMode::Down)),
                other => Err(err(format!("Unknown pen mode '{}'", other))),
            }
        }
        "H" => {
            expect_args(0)?;
            Ok(Instruction::AutoHome)
        }
        other => Err(err(format!("Unknown instruction '{}'", other))),
    }
}
