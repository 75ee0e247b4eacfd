//! Declarative argument registration
//!
//! Every command scope and flag the CLI accepts is declared here, once,
//! against the schema registry. Value sets for enum-valued flags are closed
//! lists passed into the membership validator.

use docdbctl_core::{CrossRule, FlagDef, Result, SchemaRegistry, ValueKind, Validator};

/// Accepted values for `--default-consistency-level`.
pub const CONSISTENCY_LEVELS: [&str; 5] = [
    "eventual",
    "session",
    "bounded-staleness",
    "strong",
    "consistent-prefix",
];

/// Accepted values for `--kind`.
pub const ACCOUNT_KINDS: [&str; 3] = ["global-document-db", "mongo-db", "parse"];

/// Accepted values for `--key-kind`.
pub const KEY_KINDS: [&str; 4] = [
    "primary",
    "secondary",
    "primary-readonly",
    "secondary-readonly",
];

/// Accepted values for `--capabilities`.
pub const CAPABILITIES: [&str; 4] = [
    "EnableTable",
    "EnableGremlin",
    "EnableCassandra",
    "EnableAggregationPipeline",
];

fn one_of(values: &[&str]) -> Validator {
    Validator::OneOf(values.iter().map(|v| v.to_string()).collect())
}

fn account_name() -> FlagDef {
    FlagDef::new("name", ValueKind::Str)
        .alias("-n")
        .help("Name of the database account")
        .completer("account-names")
}

fn db_name() -> FlagDef {
    FlagDef::new("db-name", ValueKind::Str)
        .alias("-d")
        .help("Database name")
}

/// Register the full command surface. Fails only on a schema authoring
/// mistake (duplicate flag at the same scope), which is fatal at startup.
pub fn load_arguments(reg: &mut SchemaRegistry) -> Result<()> {
    // account group: the name flag is shared by every subcommand.
    reg.describe("account", "Manage database accounts");
    reg.register("account", account_name())?;

    reg.describe("account list", "List database accounts");
    reg.describe("account show", "Show details of a database account");
    reg.describe("account create", "Create a database account");
    reg.describe("account update", "Update a database account");
    reg.describe("account delete", "Delete a database account");

    for scope in [
        "account show",
        "account create",
        "account update",
        "account delete",
    ] {
        reg.register(scope, account_name().required())?;
    }

    for scope in ["account create", "account update"] {
        reg.register(
            scope,
            FlagDef::new("locations", ValueKind::List)
                .validator(Validator::Pairs { contiguous: true })
                .help(
                    "Space-separated locations in 'regionName=failoverPriority' format. \
                     Priority 0 is the write region",
                ),
        )?;
        reg.register(
            scope,
            FlagDef::new("tags", ValueKind::List)
                .validator(Validator::TagPairs)
                .help("Space-separated tags in 'key[=value]' format"),
        )?;
        reg.register(
            scope,
            FlagDef::new("default-consistency-level", ValueKind::Str)
                .validator(one_of(&CONSISTENCY_LEVELS))
                .help("Default consistency level of the database account"),
        )?;
        reg.register(
            scope,
            FlagDef::new("max-staleness-prefix", ValueKind::Int)
                .validator(Validator::Range { min: 1, max: 2_147_483_647 })
                .help(
                    "With bounded-staleness consistency, the number of stale requests \
                     tolerated. Accepted range is 1 - 2,147,483,647",
                ),
        )?;
        reg.register(
            scope,
            FlagDef::new("max-interval", ValueKind::Int)
                .validator(Validator::Range { min: 1, max: 100 })
                .help(
                    "With bounded-staleness consistency, the amount of staleness (in \
                     seconds) tolerated. Accepted range is 1 - 100",
                ),
        )?;
        reg.register(
            scope,
            FlagDef::new("ip-range-filter", ValueKind::List)
                .validator(Validator::CidrList)
                .help(
                    "Firewall support. IP addresses or IP address ranges in CIDR form \
                     to include as the allowed list of client IPs. Comma-separated, \
                     no spaces",
                ),
        )?;
        reg.register(
            scope,
            FlagDef::new("enable-automatic-failover", ValueKind::Tristate).help(
                "Enable automatic failover of the write region in the rare event that \
                 the region is unavailable due to an outage",
            ),
        )?;
        reg.register(
            scope,
            FlagDef::new("capabilities", ValueKind::List)
                .validator(one_of(&CAPABILITIES))
                .help("Set custom capabilities on the database account"),
        )?;
        reg.register(
            scope,
            FlagDef::new("enable-virtual-network", ValueKind::Tristate)
                .help("Enable virtual network filtering on the database account"),
        )?;
        reg.register(
            scope,
            FlagDef::new("virtual-network-rules", ValueKind::List)
                .help("ACLs for virtual network: space-separated subnet resource IDs"),
        )?;
        reg.register(
            scope,
            FlagDef::new("enable-multiple-write-locations", ValueKind::Tristate)
                .help("Enable multiple write locations"),
        )?;
    }
    // The kind is fixed at creation time.
    reg.register(
        "account create",
        FlagDef::new("kind", ValueKind::Str)
            .validator(one_of(&ACCOUNT_KINDS))
            .default_value(docdbctl_core::FlagValue::Str("global-document-db".into()))
            .help("The kind of database account to create"),
    )?;

    reg.describe("account keys", "Manage account keys");
    reg.describe("account keys list", "List the access keys for an account");
    reg.register("account keys list", account_name().required())?;

    reg.describe("account regenerate-key", "Regenerate an access key");
    reg.register("account regenerate-key", account_name().required())?;
    reg.register(
        "account regenerate-key",
        FlagDef::new("key-kind", ValueKind::Str)
            .validator(one_of(&KEY_KINDS))
            .required()
            .help("The access key to regenerate"),
    )?;

    reg.describe(
        "account failover-priority-change",
        "Change the failover priority of account regions",
    );
    reg.register("account failover-priority-change", account_name().required())?;
    reg.register(
        "account failover-priority-change",
        FlagDef::new("failover-policies", ValueKind::List)
            .validator(Validator::Pairs { contiguous: true })
            .required()
            .help(
                "Space-separated failover policies in 'regionName=failoverPriority' \
                 format, e.g. eastus=0 westus=1",
            ),
    )?;

    reg.describe("account network-rule", "Manage account network rules");
    reg.describe("account network-rule list", "List network rules");
    reg.describe("account network-rule add", "Add a network rule");
    reg.describe("account network-rule remove", "Remove a network rule");
    reg.register("account network-rule list", account_name().required())?;
    for scope in ["account network-rule add", "account network-rule remove"] {
        reg.register(scope, account_name().required())?;
        reg.register(
            scope,
            FlagDef::new("subnet", ValueKind::Str)
                .help("Name or ID of the subnet"),
        )?;
        reg.register(
            scope,
            FlagDef::new("virtual-network", ValueKind::Str).help(
                "The name of the virtual network, which must be provided in \
                 conjunction with the name of the subnet",
            ),
        )?;
        reg.rule(
            scope,
            CrossRule::Requires {
                flag: "virtual-network".into(),
                requires: "subnet".into(),
            },
        );
    }
    reg.register(
        "account network-rule add",
        FlagDef::new("ignore-missing-endpoint", ValueKind::Tristate).help(
            "Create the rule before the virtual network has the service endpoint \
             enabled",
        ),
    )?;

    // database group
    reg.describe("database", "Manage databases within an account");
    reg.register("database", account_name().required())?;
    reg.register(
        "database",
        FlagDef::new("throughput", ValueKind::Int)
            .validator(Validator::Range { min: 400, max: 1_000_000 })
            .help("Offer throughput (RU/s)"),
    )?;
    reg.describe("database list", "List databases in an account");
    for scope in ["database create", "database show", "database delete"] {
        reg.register(scope, db_name().required())?;
    }
    reg.describe("database create", "Create a database");
    reg.describe("database show", "Show a database");
    reg.describe("database delete", "Delete a database");

    // collection group
    reg.describe("collection", "Manage collections within a database");
    reg.register("collection", account_name().required())?;
    reg.register("collection", db_name().required())?;
    reg.register(
        "collection",
        FlagDef::new("collection-name", ValueKind::Str)
            .alias("-c")
            .help("Collection name"),
    )?;
    reg.register(
        "collection",
        FlagDef::new("throughput", ValueKind::Int)
            .validator(Validator::Range { min: 400, max: 1_000_000 })
            .help("Offer throughput (RU/s)"),
    )?;
    reg.describe("collection list", "List collections in a database");
    for scope in ["collection create", "collection show", "collection delete"] {
        reg.register(
            scope,
            FlagDef::new("collection-name", ValueKind::Str)
                .alias("-c")
                .required()
                .help("Collection name"),
        )?;
    }
    reg.describe("collection create", "Create a collection");
    reg.describe("collection show", "Show a collection");
    reg.describe("collection delete", "Delete a collection");
    reg.register(
        "collection create",
        FlagDef::new("partition-key-path", ValueKind::Str)
            .help("Partition key path, e.g. '/properties/name'"),
    )?;
    reg.register(
        "collection create",
        FlagDef::new("indexing-policy", ValueKind::Json)
            .completer("files")
            .help(
                "Indexing policy as inline JSON or an @file reference, e.g. \
                 --indexing-policy @policy-file.json",
            ),
    )?;
    reg.register(
        "collection create",
        FlagDef::new("default-ttl", ValueKind::Int)
            .help("Default TTL in seconds. Provide 0 to disable"),
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docdbctl_core::{CoreError, ValidationKind, bind};

    fn registry() -> SchemaRegistry {
        let mut reg = SchemaRegistry::new();
        load_arguments(&mut reg).unwrap();
        reg
    }

    #[test]
    fn registration_is_duplicate_free() {
        // load_arguments itself would fail on a duplicate; also make sure it
        // can only be applied once to a registry.
        let mut reg = registry();
        assert!(matches!(
            load_arguments(&mut reg),
            Err(CoreError::DuplicateFlag { .. })
        ));
    }

    #[test]
    fn create_inherits_group_name_flag() {
        let reg = registry();
        let names: Vec<&str> = reg
            .resolve("account create")
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert!(names.contains(&"name"));
        assert!(names.contains(&"default-consistency-level"));
        assert!(names.contains(&"kind"));
        // Required override is the more specific definition.
        assert!(reg.lookup("account create", "name").unwrap().required);
        assert!(!reg.lookup("account", "name").unwrap().required);
    }

    #[test]
    fn list_does_not_require_a_name() {
        let reg = registry();
        let bag = bind(&reg, "account list", &Default::default()).unwrap();
        assert!(bag.is_empty());
    }

    #[test]
    fn max_staleness_prefix_bounds() {
        let reg = registry();
        let mut raw = docdbctl_core::RawArgs::new();
        raw.insert("name".into(), vec!["acct1".into()]);
        raw.insert("max-staleness-prefix".into(), vec!["0".into()]);
        let err = bind(&reg, "account update", &raw).unwrap_err();
        assert!(err.has_validation_kind(ValidationKind::OutOfRange));

        raw.insert("max-staleness-prefix".into(), vec!["2147483647".into()]);
        let bag = bind(&reg, "account update", &raw).unwrap();
        assert_eq!(bag.get_i64("max-staleness-prefix"), Some(2_147_483_647));
    }

    #[test]
    fn create_defaults_the_kind() {
        let reg = registry();
        let mut raw = docdbctl_core::RawArgs::new();
        raw.insert("name".into(), vec!["acct1".into()]);
        let bag = bind(&reg, "account create", &raw).unwrap();
        assert_eq!(bag.get_str("kind"), Some("global-document-db"));
    }

    #[test]
    fn network_rule_virtual_network_requires_subnet() {
        let reg = registry();
        let mut raw = docdbctl_core::RawArgs::new();
        raw.insert("name".into(), vec!["acct1".into()]);
        raw.insert("virtual-network".into(), vec!["vnet1".into()]);
        let err = bind(&reg, "account network-rule add", &raw).unwrap_err();
        assert!(err.has_validation_kind(ValidationKind::Missing));
    }

    #[test]
    fn every_declared_leaf_parses() {
        // Each leaf must be reachable through the generated parser.
        let reg = registry();
        let expected = [
            "account list",
            "account show",
            "account create",
            "account update",
            "account delete",
            "account keys list",
            "account regenerate-key",
            "account failover-priority-change",
            "account network-rule list",
            "account network-rule add",
            "account network-rule remove",
            "database list",
            "database create",
            "database show",
            "database delete",
            "collection list",
            "collection create",
            "collection show",
            "collection delete",
        ];
        let leaves = reg.leaf_paths();
        for path in expected {
            assert!(leaves.contains(&path.to_string()), "missing leaf {}", path);
        }
        assert_eq!(leaves.len(), expected.len());
    }
}
