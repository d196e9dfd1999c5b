//! Output produced by the command line tool for one input.

use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::{Config, EmitMode};
use crate::{parse, stringify, tokenize, Node, PositionedError};

#[derive(Debug, Error, Diagnostic)]
pub enum EmitError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] PositionedError),

    #[error("serialized output differs from the input starting at byte {offset}")]
    #[diagnostic(code(scsstree::round_trip))]
    Mismatch { offset: usize },

    #[error("could not encode output as JSON")]
    Json(#[from] serde_json::Error),
}

pub fn emit(source: &str, config: &Config) -> Result<String, EmitError> {
    match config.emit {
        EmitMode::Tree => {
            let tree = parse(source)?;
            let value = if config.positions {
                serde_json::to_value(&tree)?
            } else {
                tree.shape()
            };
            to_json(&value, config.pretty)
        }
        EmitMode::Tokens => {
            let tokens = tokenize(source)?;
            let value = if config.positions {
                serde_json::to_value(&tokens)?
            } else {
                Value::Array(tokens.iter().map(Node::shape).collect())
            };
            to_json(&value, config.pretty)
        }
        EmitMode::Source => Ok(stringify(&parse(source)?)),
        EmitMode::Check => {
            let printed = stringify(&parse(source)?);
            match first_difference(source, &printed) {
                None => Ok("ok".to_owned()),
                Some(offset) => Err(EmitError::Mismatch { offset }),
            }
        }
    }
}

fn to_json(value: &Value, pretty: bool) -> Result<String, EmitError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    debug!(bytes = json.len(), "encoded JSON");
    Ok(json)
}

fn first_difference(a: &str, b: &str) -> Option<usize> {
    let common = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    if common == a.len() && common == b.len() {
        None
    } else {
        Some(common)
    }
}
