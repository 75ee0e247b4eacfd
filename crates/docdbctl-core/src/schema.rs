//! Flag schema registry and scope tree
//!
//! Commands declare their flags against hierarchical scopes ("account",
//! "account create", "account network-rule add", ...). A child scope inherits
//! every parent flag unless it redefines the same name, in which case the
//! more specific definition wins. The registry is built once at startup and
//! is read-only afterwards; `to_command()` turns it into a runtime clap
//! parser.

use clap::{Arg, ArgAction, ArgMatches, Command};
use std::collections::BTreeMap;
use tracing::{debug, trace};

use crate::bag::FlagValue;
use crate::error::{CoreError, Result};
use crate::validate::Validator;

/// Raw, pre-validation argument values keyed by flag name.
///
/// Produced from clap matches (or assembled directly in tests) and consumed
/// by [`crate::bag::bind`].
pub type RawArgs = BTreeMap<String, Vec<String>>;

/// Declared shape of a flag's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Single string value
    Str,
    /// Single integer value
    Int,
    /// Boolean flag accepting an optional explicit true/false value
    Tristate,
    /// One or more space-separated string values
    List,
    /// Inline JSON or an @file reference
    Json,
}

/// A single flag definition. Immutable once registered.
#[derive(Debug, Clone)]
pub struct FlagDef {
    pub name: String,
    pub aliases: Vec<String>,
    pub kind: ValueKind,
    pub default: Option<FlagValue>,
    pub validators: Vec<Validator>,
    pub help: String,
    pub completer: Option<String>,
    pub required: bool,
}

impl FlagDef {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            kind,
            default: None,
            validators: Vec::new(),
            help: String::new(),
            completer: None,
            required: false,
        }
    }

    /// Absence of this flag fails binding with a `Missing` validation error.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Add a short alias like "-n" or a long alias like "--account-name".
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    #[must_use]
    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.help = text.into();
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: FlagValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Append a validator to this flag's pipeline. Validators run in the
    /// order they were added; the first failure short-circuits the rest.
    #[must_use]
    pub fn validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    #[must_use]
    pub fn completer(mut self, hint: impl Into<String>) -> Self {
        self.completer = Some(hint.into());
        self
    }
}

/// Cross-flag rule attached to a scope, checked after per-flag validation.
#[derive(Debug, Clone)]
pub enum CrossRule {
    /// `flag` may only appear together with `requires`.
    Requires { flag: String, requires: String },
    /// `a` and `b` may not appear together.
    Conflicts { a: String, b: String },
}

/// One node of the scope tree.
#[derive(Debug, Default)]
pub struct ScopeNode {
    segment: String,
    flags: Vec<FlagDef>,
    rules: Vec<CrossRule>,
    children: Vec<ScopeNode>,
    about: Option<String>,
}

impl ScopeNode {
    fn child(&self, segment: &str) -> Option<&ScopeNode> {
        self.children.iter().find(|c| c.segment == segment)
    }

    fn child_mut_or_insert(&mut self, segment: &str) -> &mut ScopeNode {
        if let Some(idx) = self.children.iter().position(|c| c.segment == segment) {
            &mut self.children[idx]
        } else {
            self.children.push(ScopeNode {
                segment: segment.to_string(),
                ..Default::default()
            });
            self.children.last_mut().unwrap()
        }
    }

    fn flag(&self, name: &str) -> Option<&FlagDef> {
        self.flags.iter().find(|f| f.name == name)
    }
}

/// Registry of flag definitions keyed by (scope path, flag name).
///
/// Registration happens once during process startup; every read operation is
/// pure, so a populated registry can be shared freely across invocations.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    root: ScopeNode,
}

fn segments(scope_path: &str) -> Vec<&str> {
    scope_path.split_whitespace().collect()
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a flag at the given scope. Intermediate scopes are created
    /// on demand. Fails with [`CoreError::DuplicateFlag`] if the flag is
    /// already registered at exactly this scope.
    pub fn register(&mut self, scope_path: &str, def: FlagDef) -> Result<()> {
        let mut node = &mut self.root;
        for seg in segments(scope_path) {
            node = node.child_mut_or_insert(seg);
        }
        if node.flag(&def.name).is_some() {
            return Err(CoreError::DuplicateFlag {
                scope: scope_path.to_string(),
                flag: def.name,
            });
        }
        trace!(scope = scope_path, flag = %def.name, "registered flag");
        node.flags.push(def);
        Ok(())
    }

    /// Attach a cross-flag rule to a scope, creating it on demand.
    pub fn rule(&mut self, scope_path: &str, rule: CrossRule) {
        let mut node = &mut self.root;
        for seg in segments(scope_path) {
            node = node.child_mut_or_insert(seg);
        }
        node.rules.push(rule);
    }

    /// Set the help text shown for a scope's generated subcommand.
    pub fn describe(&mut self, scope_path: &str, about: impl Into<String>) {
        let mut node = &mut self.root;
        for seg in segments(scope_path) {
            node = node.child_mut_or_insert(seg);
        }
        node.about = Some(about.into());
    }

    fn node(&self, scope_path: &str) -> Option<&ScopeNode> {
        let mut node = &self.root;
        for seg in segments(scope_path) {
            node = node.child(seg)?;
        }
        Some(node)
    }

    /// Walk from the exact scope up to the root and return the most specific
    /// definition of `name`, or [`CoreError::UnknownFlag`] if none exists.
    pub fn lookup(&self, scope_path: &str, name: &str) -> Result<&FlagDef> {
        let segs = segments(scope_path);
        // Collect the chain root..leaf, then search leaf-first.
        let mut chain = vec![&self.root];
        let mut node = &self.root;
        for seg in &segs {
            match node.child(seg) {
                Some(child) => {
                    chain.push(child);
                    node = child;
                }
                None => break,
            }
        }
        chain
            .iter()
            .rev()
            .find_map(|n| n.flag(name))
            .ok_or_else(|| CoreError::UnknownFlag {
                scope: scope_path.to_string(),
                flag: name.to_string(),
            })
    }

    /// Merge flag definitions root-to-leaf for a command path. More specific
    /// definitions override parents by name; first-seen ordering is kept for
    /// display. Unknown trailing segments simply stop the walk, so an empty
    /// or unmatched path yields the root's flags only.
    pub fn resolve(&self, command_path: &str) -> Vec<&FlagDef> {
        let mut merged: Vec<&FlagDef> = Vec::new();
        let mut node = &self.root;
        let mut chain = vec![&self.root];
        for seg in segments(command_path) {
            match node.child(seg) {
                Some(child) => {
                    chain.push(child);
                    node = child;
                }
                None => break,
            }
        }
        for n in chain {
            for def in &n.flags {
                if let Some(existing) = merged.iter_mut().find(|d| d.name == def.name) {
                    *existing = def;
                } else {
                    merged.push(def);
                }
            }
        }
        merged
    }

    /// Cross-flag rules merged root-to-leaf for a command path.
    pub fn rules_for(&self, command_path: &str) -> Vec<&CrossRule> {
        let mut rules = Vec::new();
        let mut node = &self.root;
        rules.extend(self.root.rules.iter());
        for seg in segments(command_path) {
            match node.child(seg) {
                Some(child) => {
                    rules.extend(child.rules.iter());
                    node = child;
                }
                None => break,
            }
        }
        rules
    }

    /// All leaf scope paths (scopes without children), space-joined.
    pub fn leaf_paths(&self) -> Vec<String> {
        fn walk(node: &ScopeNode, prefix: &str, out: &mut Vec<String>) {
            for child in &node.children {
                let path = if prefix.is_empty() {
                    child.segment.clone()
                } else {
                    format!("{} {}", prefix, child.segment)
                };
                if child.children.is_empty() {
                    out.push(path);
                } else {
                    walk(child, &path, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.root, "", &mut out);
        out
    }

    /// Build the runtime argument parser for this registry.
    ///
    /// Every scope becomes a clap subcommand carrying its *resolved* flags,
    /// so inherited parent flags are accepted directly at the leaf.
    pub fn to_command(&self, name: &'static str) -> Command {
        debug!(command = name, "building parser from schema registry");
        let mut cmd = Command::new(name);
        for child in &self.root.children {
            cmd = cmd.subcommand(self.scope_command(child, &child.segment.clone()));
        }
        cmd
    }

    fn scope_command(&self, node: &ScopeNode, path: &str) -> Command {
        let mut cmd = Command::new(node.segment.clone());
        if let Some(about) = &node.about {
            cmd = cmd.about(about.clone());
        }
        if node.children.is_empty() {
            // Only leaves take flags; inherited definitions land here via
            // resolve(), so the shared flags are accepted where they run.
            for def in self.resolve(path) {
                cmd = cmd.arg(flag_to_arg(def));
            }
        } else {
            cmd = cmd.subcommand_required(true).arg_required_else_help(true);
            for child in &node.children {
                let child_path = format!("{} {}", path, child.segment);
                cmd = cmd.subcommand(self.scope_command(child, &child_path));
            }
        }
        cmd
    }

    /// Extract raw string values for every flag resolved at `command_path`
    /// from clap matches. Defaults are applied later, by the binder.
    pub fn raw_from_matches(&self, command_path: &str, matches: &ArgMatches) -> RawArgs {
        let mut raw = RawArgs::new();
        for def in self.resolve(command_path) {
            if let Ok(Some(values)) = matches.try_get_many::<String>(&def.name) {
                raw.insert(def.name.clone(), values.cloned().collect());
            }
        }
        raw
    }
}

fn flag_to_arg(def: &FlagDef) -> Arg {
    let mut arg = Arg::new(def.name.clone())
        .long(def.name.clone())
        .help(def.help.clone());
    for alias in &def.aliases {
        let mut chars = alias.trim_start_matches('-').chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => arg = arg.short(c),
            _ => arg = arg.visible_alias(alias.trim_start_matches('-').to_string()),
        }
    }
    match def.kind {
        ValueKind::List => {
            arg = arg.num_args(1..).action(ArgAction::Append);
        }
        ValueKind::Tristate => {
            arg = arg
                .num_args(0..=1)
                .default_missing_value("true")
                .value_parser(["true", "false", "yes", "no", "1", "0"]);
        }
        ValueKind::Str | ValueKind::Int | ValueKind::Json => {
            arg = arg.num_args(1).action(ArgAction::Set);
        }
    }
    arg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SchemaRegistry {
        let mut reg = SchemaRegistry::new();
        reg.register("account", FlagDef::new("name", ValueKind::Str).alias("-n"))
            .unwrap();
        reg.register("account", FlagDef::new("tags", ValueKind::List))
            .unwrap();
        reg.register(
            "account create",
            FlagDef::new("kind", ValueKind::Str).help("account kind"),
        )
        .unwrap();
        reg
    }

    #[test]
    fn duplicate_flag_at_same_scope_rejected() {
        let mut reg = registry();
        let err = reg
            .register("account", FlagDef::new("name", ValueKind::Str))
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateFlag { .. }));
    }

    #[test]
    fn same_name_at_child_scope_overrides() {
        let mut reg = registry();
        reg.register(
            "account create",
            FlagDef::new("name", ValueKind::Str).help("create-specific"),
        )
        .unwrap();

        let def = reg.lookup("account create", "name").unwrap();
        assert_eq!(def.help, "create-specific");
        // Parent definition untouched.
        let def = reg.lookup("account", "name").unwrap();
        assert_eq!(def.help, "");
    }

    #[test]
    fn lookup_walks_up_to_root() {
        let reg = registry();
        assert!(reg.lookup("account create", "tags").is_ok());
        assert!(matches!(
            reg.lookup("account create", "bogus"),
            Err(CoreError::UnknownFlag { .. })
        ));
    }

    #[test]
    fn resolve_includes_inherited_parent_flags() {
        let reg = registry();
        let names: Vec<&str> = reg
            .resolve("account create")
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names, vec!["name", "tags", "kind"]);
    }

    #[test]
    fn resolve_preserves_first_seen_order_on_override() {
        let mut reg = registry();
        reg.register(
            "account create",
            FlagDef::new("name", ValueKind::Str).help("override"),
        )
        .unwrap();
        let defs = reg.resolve("account create");
        let names: Vec<&str> = defs.iter().map(|d| d.name.as_str()).collect();
        // Override keeps the parent's position.
        assert_eq!(names, vec!["name", "tags", "kind"]);
        assert_eq!(defs[0].help, "override");
    }

    #[test]
    fn resolve_empty_path_yields_root_only() {
        let mut reg = registry();
        reg.register("", FlagDef::new("global", ValueKind::Str))
            .unwrap();
        let names: Vec<&str> = reg.resolve("").iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["global"]);
    }

    #[test]
    fn generated_parser_accepts_inherited_flags_at_leaf() {
        let reg = registry();
        let cmd = reg.to_command("docdbctl");
        let matches = cmd
            .try_get_matches_from(["docdbctl", "account", "create", "--name", "acct1", "--kind", "mongo-db"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let (_, leaf) = sub.subcommand().unwrap();
        let raw = reg.raw_from_matches("account create", leaf);
        assert_eq!(raw["name"], vec!["acct1".to_string()]);
        assert_eq!(raw["kind"], vec!["mongo-db".to_string()]);
    }

    #[test]
    fn leaf_paths_enumerates_runnable_scopes() {
        let reg = registry();
        assert_eq!(reg.leaf_paths(), vec!["account create".to_string()]);
    }
}
