//! Validator pipeline
//!
//! Each validator is a pure function from raw parsed values to a normalized
//! [`FlagValue`] or a [`ValidationError`]. Validators attached to a flag run
//! in registration order and the first failure short-circuits the rest for
//! that flag; other flags are still validated independently so a single
//! invocation reports every failing flag at once.

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;

use crate::bag::FlagValue;
use crate::schema::{FlagDef, ValueKind};

/// Classification of a validation failure. Terminal for the invocation,
/// never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    BadFormat,
    OutOfRange,
    MutuallyExclusive,
    Missing,
}

impl std::fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationKind::BadFormat => write!(f, "bad format"),
            ValidationKind::OutOfRange => write!(f, "out of range"),
            ValidationKind::MutuallyExclusive => write!(f, "mutually exclusive"),
            ValidationKind::Missing => write!(f, "missing"),
        }
    }
}

/// A validation failure with the offending flag name attached.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("--{flag}: {message} ({kind})")]
pub struct ValidationError {
    pub kind: ValidationKind,
    pub flag: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(kind: ValidationKind, flag: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            flag: flag.into(),
            message: message.into(),
        }
    }
}

/// Built-in validators. Closed sets are passed in explicitly rather than
/// derived from any external type.
#[derive(Debug, Clone)]
pub enum Validator {
    /// Integer bounds check, inclusive on both ends.
    Range { min: i64, max: i64 },
    /// Set membership; applies to a single value or to every list element.
    /// Matching is case-insensitive and normalizes to the canonical casing.
    OneOf(Vec<String>),
    /// IPv4 addresses or CIDR ranges, comma-separated, no spaces.
    CidrList,
    /// `key=priority` pairs, unique keys, ordered by priority on output.
    /// With `contiguous` set, priorities must form 0..n with no gaps.
    Pairs { contiguous: bool },
    /// `key[=value]` pairs with unique keys, normalized to a tag map.
    TagPairs,
}

impl Validator {
    /// Apply this validator to an already kind-parsed value.
    pub fn apply(&self, flag: &str, value: FlagValue) -> Result<FlagValue, ValidationError> {
        match self {
            Validator::Range { min, max } => apply_range(flag, value, *min, *max),
            Validator::OneOf(allowed) => apply_one_of(flag, value, allowed),
            Validator::CidrList => apply_cidr_list(flag, value),
            Validator::Pairs { contiguous } => apply_pairs(flag, value, *contiguous),
            Validator::TagPairs => apply_tag_pairs(flag, value),
        }
    }
}

fn apply_range(
    flag: &str,
    value: FlagValue,
    min: i64,
    max: i64,
) -> Result<FlagValue, ValidationError> {
    match value {
        FlagValue::Int(n) if n >= min && n <= max => Ok(FlagValue::Int(n)),
        FlagValue::Int(n) => Err(ValidationError::new(
            ValidationKind::OutOfRange,
            flag,
            format!("value {} is outside the accepted range {} - {}", n, min, max),
        )),
        other => Err(ValidationError::new(
            ValidationKind::BadFormat,
            flag,
            format!("expected an integer, got {:?}", other),
        )),
    }
}

fn match_member(allowed: &[String], candidate: &str) -> Option<String> {
    allowed
        .iter()
        .find(|a| a.eq_ignore_ascii_case(candidate))
        .cloned()
}

fn apply_one_of(
    flag: &str,
    value: FlagValue,
    allowed: &[String],
) -> Result<FlagValue, ValidationError> {
    let not_member = |v: &str| {
        ValidationError::new(
            ValidationKind::BadFormat,
            flag,
            format!("'{}' is not one of: {}", v, allowed.join(", ")),
        )
    };
    match value {
        FlagValue::Str(s) => match_member(allowed, &s)
            .map(FlagValue::Str)
            .ok_or_else(|| not_member(&s)),
        FlagValue::List(items) => {
            if items.is_empty() {
                return Err(ValidationError::new(
                    ValidationKind::Missing,
                    flag,
                    "at least one value is required",
                ));
            }
            let mut normalized = Vec::with_capacity(items.len());
            for item in &items {
                normalized.push(match_member(allowed, item).ok_or_else(|| not_member(item))?);
            }
            Ok(FlagValue::List(normalized))
        }
        other => Err(ValidationError::new(
            ValidationKind::BadFormat,
            flag,
            format!("expected a string value, got {:?}", other),
        )),
    }
}

fn valid_cidr(entry: &str) -> bool {
    let (addr, prefix) = match entry.split_once('/') {
        Some((addr, prefix)) => (addr, Some(prefix)),
        None => (entry, None),
    };
    if addr.parse::<Ipv4Addr>().is_err() {
        return false;
    }
    match prefix {
        None => true,
        Some(p) => matches!(p.parse::<u8>(), Ok(n) if n <= 32),
    }
}

fn apply_cidr_list(flag: &str, value: FlagValue) -> Result<FlagValue, ValidationError> {
    let items = match value {
        FlagValue::List(items) => items,
        FlagValue::Str(s) => vec![s],
        other => {
            return Err(ValidationError::new(
                ValidationKind::BadFormat,
                flag,
                format!("expected a list of IP ranges, got {:?}", other),
            ));
        }
    };
    // Tokens may themselves be comma-separated ("10.0.0.0/8,20.0.0.1").
    let mut entries = Vec::new();
    for token in &items {
        if token.contains(' ') {
            return Err(ValidationError::new(
                ValidationKind::BadFormat,
                flag,
                format!("'{}' must not contain spaces", token),
            ));
        }
        for entry in token.split(',').filter(|e| !e.is_empty()) {
            entries.push(entry.to_string());
        }
    }
    if entries.is_empty() {
        return Err(ValidationError::new(
            ValidationKind::Missing,
            flag,
            "at least one IP address or CIDR range is required",
        ));
    }
    for entry in &entries {
        if !valid_cidr(entry) {
            return Err(ValidationError::new(
                ValidationKind::BadFormat,
                flag,
                format!("'{}' is not a valid IPv4 address or CIDR range", entry),
            ));
        }
    }
    Ok(FlagValue::List(entries))
}

fn apply_pairs(
    flag: &str,
    value: FlagValue,
    contiguous: bool,
) -> Result<FlagValue, ValidationError> {
    let tokens = match value {
        FlagValue::List(items) => items,
        FlagValue::Str(s) => vec![s],
        other => {
            return Err(ValidationError::new(
                ValidationKind::BadFormat,
                flag,
                format!("expected key=value pairs, got {:?}", other),
            ));
        }
    };
    if tokens.is_empty() {
        return Err(ValidationError::new(
            ValidationKind::Missing,
            flag,
            "at least one key=value pair is required",
        ));
    }
    let mut pairs: Vec<(String, i64)> = Vec::with_capacity(tokens.len());
    for token in &tokens {
        let (key, val) = token.split_once('=').ok_or_else(|| {
            ValidationError::new(
                ValidationKind::BadFormat,
                flag,
                format!("'{}' is not in key=value form", token),
            )
        })?;
        if key.is_empty() {
            return Err(ValidationError::new(
                ValidationKind::BadFormat,
                flag,
                format!("'{}' has an empty key", token),
            ));
        }
        let priority: i64 = val.parse().map_err(|_| {
            ValidationError::new(
                ValidationKind::BadFormat,
                flag,
                format!("'{}' has a non-integer priority '{}'", token, val),
            )
        })?;
        if pairs.iter().any(|(k, _)| k == key) {
            return Err(ValidationError::new(
                ValidationKind::BadFormat,
                flag,
                format!("duplicate key '{}' in '{}'", key, token),
            ));
        }
        pairs.push((key.to_string(), priority));
    }
    if contiguous {
        let priorities: BTreeSet<i64> = pairs.iter().map(|(_, p)| *p).collect();
        if priorities.len() != pairs.len() {
            return Err(ValidationError::new(
                ValidationKind::BadFormat,
                flag,
                "each priority may be used only once",
            ));
        }
        let expected: BTreeSet<i64> = (0..pairs.len() as i64).collect();
        if priorities != expected {
            return Err(ValidationError::new(
                ValidationKind::OutOfRange,
                flag,
                format!(
                    "priorities must form a contiguous sequence 0 - {}",
                    pairs.len() - 1
                ),
            ));
        }
    }
    pairs.sort_by_key(|(_, p)| *p);
    Ok(FlagValue::Pairs(pairs))
}

fn apply_tag_pairs(flag: &str, value: FlagValue) -> Result<FlagValue, ValidationError> {
    let tokens = match value {
        FlagValue::List(items) => items,
        FlagValue::Str(s) => vec![s],
        other => {
            return Err(ValidationError::new(
                ValidationKind::BadFormat,
                flag,
                format!("expected key[=value] pairs, got {:?}", other),
            ));
        }
    };
    if tokens.is_empty() {
        return Err(ValidationError::new(
            ValidationKind::Missing,
            flag,
            "at least one tag is required",
        ));
    }
    let mut map = BTreeMap::new();
    for token in &tokens {
        let (key, val) = match token.split_once('=') {
            Some((k, v)) => (k, v),
            None => (token.as_str(), ""),
        };
        if key.is_empty() {
            return Err(ValidationError::new(
                ValidationKind::BadFormat,
                flag,
                format!("'{}' has an empty key", token),
            ));
        }
        if map.contains_key(key) {
            return Err(ValidationError::new(
                ValidationKind::BadFormat,
                flag,
                format!("duplicate tag key '{}'", key),
            ));
        }
        map.insert(key.to_string(), val.to_string());
    }
    Ok(FlagValue::Tags(map))
}

/// Parse raw string tokens into a provisional [`FlagValue`] according to the
/// flag's declared kind. Validators refine the result afterwards.
pub fn parse_kind(def: &FlagDef, tokens: &[String]) -> Result<FlagValue, ValidationError> {
    match def.kind {
        ValueKind::Str => match tokens.first() {
            Some(s) => Ok(FlagValue::Str(s.clone())),
            None => Err(ValidationError::new(
                ValidationKind::Missing,
                &def.name,
                "a value is required",
            )),
        },
        ValueKind::Int => {
            let raw = tokens.first().map(String::as_str).unwrap_or("");
            raw.parse::<i64>().map(FlagValue::Int).map_err(|_| {
                ValidationError::new(
                    ValidationKind::BadFormat,
                    &def.name,
                    format!("'{}' is not an integer", raw),
                )
            })
        }
        ValueKind::Tristate => {
            let raw = tokens.first().map(String::as_str).unwrap_or("true");
            match raw.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(FlagValue::Bool(true)),
                "false" | "no" | "0" => Ok(FlagValue::Bool(false)),
                _ => Err(ValidationError::new(
                    ValidationKind::BadFormat,
                    &def.name,
                    format!("'{}' is not a boolean (expected true or false)", raw),
                )),
            }
        }
        ValueKind::List => Ok(FlagValue::List(tokens.to_vec())),
        ValueKind::Json => {
            let raw = tokens.first().map(String::as_str).unwrap_or("");
            let content = if let Some(path) = raw.strip_prefix('@') {
                std::fs::read_to_string(path).map_err(|e| {
                    ValidationError::new(
                        ValidationKind::BadFormat,
                        &def.name,
                        format!("cannot read '{}': {}", path, e),
                    )
                })?
            } else {
                raw.to_string()
            };
            serde_json::from_str(&content).map(FlagValue::Json).map_err(|e| {
                ValidationError::new(
                    ValidationKind::BadFormat,
                    &def.name,
                    format!("invalid JSON: {}", e),
                )
            })
        }
    }
}
