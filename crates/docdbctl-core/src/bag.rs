//! Normalized argument values and the per-invocation argument bag
//!
//! [`bind`] is the single entry point from raw parsed flags to a validated
//! [`ArgumentBag`]: defaults are applied, each flag runs its validator chain,
//! cross-flag rules are checked last, and every failing flag is reported in
//! one pass. A bag is created per invocation, handed to the dispatcher, and
//! discarded when the bound operation returns.

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::trace;

use crate::error::{CoreError, Result};
use crate::schema::{CrossRule, RawArgs, SchemaRegistry, ValueKind};
use crate::validate::{ValidationError, ValidationKind, parse_kind};

/// A normalized flag value.
#[derive(Debug, Clone, PartialEq)]
pub enum FlagValue {
    Str(String),
    Int(i64),
    Bool(bool),
    List(Vec<String>),
    /// Key/priority pairs, ordered by priority.
    Pairs(Vec<(String, i64)>),
    /// Tag keys with their values; a bare key carries an empty value.
    Tags(BTreeMap<String, String>),
    Json(Value),
}

impl FlagValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FlagValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FlagValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FlagValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FlagValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_pairs(&self) -> Option<&[(String, i64)]> {
        match self {
            FlagValue::Pairs(pairs) => Some(pairs),
            _ => None,
        }
    }

    pub fn as_tags(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            FlagValue::Tags(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            FlagValue::Json(v) => Some(v),
            _ => None,
        }
    }

    /// JSON rendering used when building request bodies.
    pub fn to_json(&self) -> Value {
        match self {
            FlagValue::Str(s) => Value::String(s.clone()),
            FlagValue::Int(n) => Value::from(*n),
            FlagValue::Bool(b) => Value::Bool(*b),
            FlagValue::List(items) => {
                Value::Array(items.iter().map(|s| Value::String(s.clone())).collect())
            }
            FlagValue::Pairs(pairs) => Value::Array(
                pairs
                    .iter()
                    .map(|(k, p)| serde_json::json!({"name": k, "priority": p}))
                    .collect(),
            ),
            FlagValue::Tags(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
            FlagValue::Json(v) => v.clone(),
        }
    }

    /// Serialize back to the CLI token(s) that would reproduce this value.
    fn to_tokens(&self) -> Vec<String> {
        match self {
            FlagValue::Str(s) => vec![s.clone()],
            FlagValue::Int(n) => vec![n.to_string()],
            FlagValue::Bool(b) => vec![b.to_string()],
            FlagValue::List(items) => items.clone(),
            FlagValue::Pairs(pairs) => {
                pairs.iter().map(|(k, p)| format!("{}={}", k, p)).collect()
            }
            FlagValue::Tags(map) => map.iter().map(|(k, v)| format!("{}={}", k, v)).collect(),
            FlagValue::Json(v) => vec![v.to_string()],
        }
    }
}

/// Validated, normalized arguments for one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentBag {
    values: BTreeMap<String, FlagValue>,
}

impl ArgumentBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FlagValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FlagValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FlagValue::as_str)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(FlagValue::as_i64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(FlagValue::as_bool)
    }

    pub fn get_list(&self, name: &str) -> Option<&[String]> {
        self.get(name).and_then(FlagValue::as_list)
    }

    pub fn get_pairs(&self, name: &str) -> Option<&[(String, i64)]> {
        self.get(name).and_then(FlagValue::as_pairs)
    }

    pub fn get_tags(&self, name: &str) -> Option<&BTreeMap<String, String>> {
        self.get(name).and_then(FlagValue::as_tags)
    }

    pub fn get_json(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(FlagValue::as_json)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FlagValue)> {
        self.values.iter()
    }

    /// Re-serialize the bag to CLI flag text. Re-parsing and re-binding the
    /// result against the same scope yields an equal bag.
    pub fn to_cli_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        for (name, value) in &self.values {
            args.push(format!("--{}", name));
            args.extend(value.to_tokens());
        }
        args
    }
}

fn check_cross_rules(
    rules: &[&CrossRule],
    bag: &ArgumentBag,
    errors: &mut Vec<ValidationError>,
) {
    for rule in rules {
        match rule {
            CrossRule::Requires { flag, requires } => {
                if bag.contains(flag) && !bag.contains(requires) {
                    errors.push(ValidationError::new(
                        ValidationKind::Missing,
                        requires.clone(),
                        format!("--{} must be provided together with --{}", flag, requires),
                    ));
                }
            }
            CrossRule::Conflicts { a, b } => {
                if bag.contains(a) && bag.contains(b) {
                    errors.push(ValidationError::new(
                        ValidationKind::MutuallyExclusive,
                        a.clone(),
                        format!("--{} cannot be combined with --{}", a, b),
                    ));
                }
            }
        }
    }
}

/// Bind raw arguments against a scope: apply defaults, run each flag's
/// validator pipeline, then check cross-flag rules. All failing flags are
/// reported together; a raw flag that is not registered anywhere along the
/// scope chain fails with [`CoreError::UnknownFlag`].
pub fn bind(registry: &SchemaRegistry, scope_path: &str, raw: &RawArgs) -> Result<ArgumentBag> {
    let defs = registry.resolve(scope_path);

    for name in raw.keys() {
        if !defs.iter().any(|d| d.name == *name) {
            return Err(CoreError::UnknownFlag {
                scope: scope_path.to_string(),
                flag: name.clone(),
            });
        }
    }

    let mut bag = ArgumentBag::new();
    let mut errors: Vec<ValidationError> = Vec::new();

    for def in &defs {
        let tokens = match raw.get(&def.name) {
            Some(tokens) => tokens.clone(),
            None => {
                if let Some(default) = &def.default {
                    bag.insert(def.name.clone(), default.clone());
                } else if def.required {
                    errors.push(ValidationError::new(
                        ValidationKind::Missing,
                        def.name.clone(),
                        "this flag is required",
                    ));
                }
                continue;
            }
        };

        // Empty occurrences only happen for list-shaped flags; surface them
        // as Missing rather than silently binding an empty list.
        if tokens.is_empty() && def.kind == ValueKind::List {
            errors.push(ValidationError::new(
                ValidationKind::Missing,
                def.name.clone(),
                "at least one value is required",
            ));
            continue;
        }

        let mut value = match parse_kind(def, &tokens) {
            Ok(v) => v,
            Err(e) => {
                errors.push(e);
                continue;
            }
        };

        let mut failed = false;
        for validator in &def.validators {
            match validator.apply(&def.name, value.clone()) {
                Ok(v) => value = v,
                Err(e) => {
                    // First failure wins for this flag; keep validating the
                    // other flags.
                    errors.push(e);
                    failed = true;
                    break;
                }
            }
        }
        if !failed {
            bag.insert(def.name.clone(), value);
        }
    }

    check_cross_rules(&registry.rules_for(scope_path), &bag, &mut errors);

    if errors.is_empty() {
        trace!(scope = scope_path, flags = bag.len(), "bound argument bag");
        Ok(bag)
    } else {
        Err(CoreError::Validation(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FlagDef, ValueKind};
    use crate::validate::Validator;
    use pretty_assertions::assert_eq;

    fn registry() -> SchemaRegistry {
        let mut reg = SchemaRegistry::new();
        reg.register("account", FlagDef::new("name", ValueKind::Str))
            .unwrap();
        for scope in ["account create", "account update"] {
            reg.register(
                scope,
                FlagDef::new("max-staleness-prefix", ValueKind::Int)
                    .validator(Validator::Range { min: 1, max: 2_147_483_647 }),
            )
            .unwrap();
            reg.register(
                scope,
                FlagDef::new("enable-automatic-failover", ValueKind::Tristate),
            )
            .unwrap();
            reg.register(
                scope,
                FlagDef::new("ip-range-filter", ValueKind::List).validator(Validator::CidrList),
            )
            .unwrap();
            reg.register(
                scope,
                FlagDef::new("tags", ValueKind::List).validator(Validator::TagPairs),
            )
            .unwrap();
        }
        reg.register(
            "account failover-priority-change",
            FlagDef::new("failover-policies", ValueKind::List)
                .validator(Validator::Pairs { contiguous: true }),
        )
        .unwrap();
        reg
    }

    fn raw(entries: &[(&str, &[&str])]) -> RawArgs {
        entries
            .iter()
            .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
            .collect()
    }

    #[test]
    fn bind_normalizes_types() {
        let reg = registry();
        let bag = bind(
            &reg,
            "account update",
            &raw(&[
                ("name", &["acct1"]),
                ("max-staleness-prefix", &["100"]),
                ("enable-automatic-failover", &["true"]),
            ]),
        )
        .unwrap();
        assert_eq!(bag.get_str("name"), Some("acct1"));
        assert_eq!(bag.get_i64("max-staleness-prefix"), Some(100));
        assert_eq!(bag.get_bool("enable-automatic-failover"), Some(true));
    }

    #[test]
    fn bind_reports_all_failing_flags() {
        let reg = registry();
        let err = bind(
            &reg,
            "account update",
            &raw(&[
                ("max-staleness-prefix", &["0"]),
                ("ip-range-filter", &["bogus"]),
                ("name", &["acct1"]),
            ]),
        )
        .unwrap_err();
        match err {
            CoreError::Validation(errors) => {
                assert_eq!(errors.len(), 2);
                let flags: Vec<&str> = errors.iter().map(|e| e.flag.as_str()).collect();
                assert!(flags.contains(&"max-staleness-prefix"));
                assert!(flags.contains(&"ip-range-filter"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn bind_rejects_unknown_flag() {
        let reg = registry();
        let err = bind(&reg, "account update", &raw(&[("bogus", &["x"])])).unwrap_err();
        assert!(matches!(err, CoreError::UnknownFlag { .. }));
    }

    #[test]
    fn required_flag_absence_is_missing() {
        let mut reg = SchemaRegistry::new();
        reg.register(
            "account show",
            FlagDef::new("name", ValueKind::Str).required(),
        )
        .unwrap();
        let err = bind(&reg, "account show", &RawArgs::new()).unwrap_err();
        match err {
            CoreError::Validation(errors) => {
                assert_eq!(errors[0].kind, ValidationKind::Missing);
                assert_eq!(errors[0].flag, "name");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn bind_applies_defaults_when_absent() {
        let mut reg = SchemaRegistry::new();
        reg.register(
            "account create",
            FlagDef::new("kind", ValueKind::Str)
                .default_value(FlagValue::Str("global-document-db".into())),
        )
        .unwrap();
        let bag = bind(&reg, "account create", &RawArgs::new()).unwrap();
        assert_eq!(bag.get_str("kind"), Some("global-document-db"));
    }

    #[test]
    fn requires_rule_failure_is_missing() {
        let mut reg = SchemaRegistry::new();
        reg.register("network-rule add", FlagDef::new("subnet", ValueKind::Str))
            .unwrap();
        reg.register(
            "network-rule add",
            FlagDef::new("virtual-network", ValueKind::Str),
        )
        .unwrap();
        reg.rule(
            "network-rule add",
            CrossRule::Requires {
                flag: "virtual-network".into(),
                requires: "subnet".into(),
            },
        );
        let err = bind(
            &reg,
            "network-rule add",
            &raw(&[("virtual-network", &["vnet1"])]),
        )
        .unwrap_err();
        match err {
            CoreError::Validation(errors) => {
                assert_eq!(errors[0].kind, ValidationKind::Missing);
                assert_eq!(errors[0].flag, "subnet");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn conflicts_rule_failure_is_mutually_exclusive() {
        let mut reg = SchemaRegistry::new();
        reg.register("op", FlagDef::new("inline", ValueKind::Str)).unwrap();
        reg.register("op", FlagDef::new("from-file", ValueKind::Str)).unwrap();
        reg.rule(
            "op",
            CrossRule::Conflicts {
                a: "inline".into(),
                b: "from-file".into(),
            },
        );
        let err = bind(
            &reg,
            "op",
            &raw(&[("inline", &["{}"]), ("from-file", &["f.json"])]),
        )
        .unwrap_err();
        match err {
            CoreError::Validation(errors) => {
                assert_eq!(errors[0].kind, ValidationKind::MutuallyExclusive);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn bag_round_trips_through_cli_args() {
        let reg = registry();
        let bag = bind(
            &reg,
            "account update",
            &raw(&[
                ("max-staleness-prefix", &["1"]),
                ("enable-automatic-failover", &["true"]),
                ("ip-range-filter", &["10.0.0.0/8", "20.1.2.3"]),
            ]),
        )
        .unwrap();

        // Feed the serialized form through the generated parser and bind again.
        let cmd = reg.to_command("docdbctl");
        let mut argv = vec!["docdbctl".to_string(), "account".to_string(), "update".to_string()];
        argv.extend(bag.to_cli_args());
        let matches = cmd.try_get_matches_from(argv).unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let (_, leaf) = sub.subcommand().unwrap();
        let reparsed = bind(
            &reg,
            "account update",
            &reg.raw_from_matches("account update", leaf),
        )
        .unwrap();
        assert_eq!(bag, reparsed);
    }

    #[test]
    fn tag_values_round_trip_through_cli_args() {
        let reg = registry();
        let bag = bind(
            &reg,
            "account update",
            &raw(&[("tags", &["env=prod", "owner"])]),
        )
        .unwrap();
        let expected: Vec<String> = ["--tags", "env=prod", "owner="]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(bag.to_cli_args(), expected);

        let cmd = reg.to_command("docdbctl");
        let mut argv = vec!["docdbctl".to_string(), "account".to_string(), "update".to_string()];
        argv.extend(bag.to_cli_args());
        let matches = cmd.try_get_matches_from(argv).unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let (_, leaf) = sub.subcommand().unwrap();
        let reparsed = bind(
            &reg,
            "account update",
            &reg.raw_from_matches("account update", leaf),
        )
        .unwrap();
        assert_eq!(bag, reparsed);
    }

    #[test]
    fn failover_policy_scenario() {
        let reg = registry();
        let bag = bind(
            &reg,
            "account failover-priority-change",
            &raw(&[("failover-policies", &["eastus=0", "westus=1"])]),
        )
        .unwrap();
        assert_eq!(
            bag.get_pairs("failover-policies").unwrap(),
            &[("eastus".to_string(), 0), ("westus".to_string(), 1)]
        );

        let err = bind(
            &reg,
            "account failover-priority-change",
            &raw(&[("failover-policies", &["eastus=0", "eastus=1"])]),
        )
        .unwrap_err();
        match err {
            CoreError::Validation(errors) => {
                assert_eq!(errors[0].kind, ValidationKind::BadFormat)
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
