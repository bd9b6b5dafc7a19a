use crate::sweep::Combination;
use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Serializer, Value};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to access input document {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Input document {path:?} is not valid JSON")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to serialize input document")]
    Serialize(#[from] serde_json::Error),
    #[error("Input document must be a JSON object")]
    NotAnObject,
    #[error("Input must contain '{field}' of type {kind}")]
    MustContain {
        field: &'static str,
        kind: &'static str,
    },
    #[error("mmax ({mmax}) must be less than or equal to lmax ({lmax})")]
    MmaxExceedsLmax { mmax: f64, lmax: f64 },
}

/// numeric fields every basis block has to carry
const BASIS_NUMBERS: [&str; 6] = ["order", "num_nodes", "x_min", "x_max", "lmax", "mmax"];

pub fn load(path: &Path) -> Result<Value, InputError> {
    let source = fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&source).map_err(|source| InputError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Overwrite the four swept fields, every other field is left untouched
pub fn apply(document: &mut Value, combination: &Combination) -> Result<(), InputError> {
    let root = document.as_object_mut().ok_or(InputError::NotAnObject)?;
    root.insert("time_step".to_string(), combination.time_step.into());

    let basis = root
        .get_mut("basis")
        .and_then(Value::as_object_mut)
        .ok_or(InputError::MustContain {
            field: "basis",
            kind: "object",
        })?;
    basis.insert("num_nodes".to_string(), combination.num_nodes.into());
    basis.insert("x_max".to_string(), combination.x_max.into());
    basis.insert("lmax".to_string(), combination.lmax.into());

    Ok(())
}

/// Same acceptance rules the compute binary applies to the basis block
pub fn validate_basis(document: &Value) -> Result<(), InputError> {
    let basis = document
        .get("basis")
        .filter(|basis| basis.is_object())
        .ok_or(InputError::MustContain {
            field: "basis",
            kind: "object",
        })?;

    if !basis.get("node_sequence").map_or(false, Value::is_string) {
        return Err(InputError::MustContain {
            field: "node_sequence",
            kind: "string",
        });
    }

    for field in BASIS_NUMBERS {
        if !basis.get(field).map_or(false, Value::is_number) {
            return Err(InputError::MustContain {
                field,
                kind: "number",
            });
        }
    }

    let number = |field: &str| basis.get(field).and_then(Value::as_f64).unwrap_or_default();
    let (mmax, lmax) = (number("mmax"), number("lmax"));
    if mmax > lmax {
        return Err(InputError::MmaxExceedsLmax { mmax, lmax });
    }

    Ok(())
}

/// Render with a four space indent, matching how the documents are written by hand
pub fn to_pretty_string(document: &Value) -> Result<String, InputError> {
    let mut buffer = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    document.serialize(&mut serializer)?;

    // serde_json only ever emits valid UTF-8
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Load the copied document, apply the combination and write it back in place
pub fn rewrite(path: &Path, combination: &Combination) -> Result<Value, InputError> {
    let mut document = load(path)?;
    apply(&mut document, combination)?;
    validate_basis(&document)?;

    // fs::write truncates, so nothing of the previous, possibly longer, content survives
    fs::write(path, to_pretty_string(&document)?).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = ?path, "Rewrote input document");

    Ok(document)
}
