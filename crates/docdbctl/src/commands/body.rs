//! Request body construction
//!
//! Translates normalized flag values into the JSON shapes the management
//! plane expects. Only flags present in the bag appear in the body, so
//! update requests stay sparse.

use serde_json::{Map, Value, json};

use docdbctl_core::ArgumentBag;

/// Body for account create/update requests.
pub fn account_body(bag: &ArgumentBag) -> Value {
    let mut body = Map::new();

    if let Some(pairs) = bag.get_pairs("locations") {
        let locations: Vec<Value> = pairs
            .iter()
            .map(|(region, priority)| {
                json!({"locationName": region, "failoverPriority": priority})
            })
            .collect();
        body.insert("locations".into(), Value::Array(locations));
    }

    if let Some(kind) = bag.get_str("kind") {
        body.insert("kind".into(), Value::String(kind.to_string()));
    }

    let mut consistency = Map::new();
    if let Some(level) = bag.get_str("default-consistency-level") {
        consistency.insert(
            "defaultConsistencyLevel".into(),
            Value::String(level.to_string()),
        );
    }
    if let Some(n) = bag.get_i64("max-staleness-prefix") {
        consistency.insert("maxStalenessPrefix".into(), Value::from(n));
    }
    if let Some(n) = bag.get_i64("max-interval") {
        consistency.insert("maxIntervalInSeconds".into(), Value::from(n));
    }
    if !consistency.is_empty() {
        body.insert("consistencyPolicy".into(), Value::Object(consistency));
    }

    // The wire format wants one comma-joined string.
    if let Some(ranges) = bag.get_list("ip-range-filter") {
        body.insert("ipRangeFilter".into(), Value::String(ranges.join(",")));
    }

    if let Some(enabled) = bag.get_bool("enable-automatic-failover") {
        body.insert("enableAutomaticFailover".into(), Value::Bool(enabled));
    }

    if let Some(caps) = bag.get_list("capabilities") {
        let caps: Vec<Value> = caps.iter().map(|c| json!({"name": c})).collect();
        body.insert("capabilities".into(), Value::Array(caps));
    }

    if let Some(enabled) = bag.get_bool("enable-virtual-network") {
        body.insert("isVirtualNetworkFilterEnabled".into(), Value::Bool(enabled));
    }

    if let Some(rules) = bag.get_list("virtual-network-rules") {
        let rules: Vec<Value> = rules.iter().map(|r| json!({"id": r})).collect();
        body.insert("virtualNetworkRules".into(), Value::Array(rules));
    }

    if let Some(enabled) = bag.get_bool("enable-multiple-write-locations") {
        body.insert("enableMultipleWriteLocations".into(), Value::Bool(enabled));
    }

    if let Some(tags) = bag.get("tags") {
        body.insert("tags".into(), tags.to_json());
    }

    Value::Object(body)
}

/// Ordered failover policies for a priority-change request.
pub fn failover_policies(bag: &ArgumentBag) -> Value {
    let policies: Vec<Value> = bag
        .get_pairs("failover-policies")
        .map(|pairs| {
            pairs
                .iter()
                .map(|(region, priority)| {
                    json!({"locationName": region, "failoverPriority": priority})
                })
                .collect()
        })
        .unwrap_or_default();
    Value::Array(policies)
}

/// Body for network-rule add/remove requests.
pub fn network_rule_body(bag: &ArgumentBag) -> Value {
    let mut body = Map::new();
    if let Some(subnet) = bag.get_str("subnet") {
        body.insert("subnet".into(), Value::String(subnet.to_string()));
    }
    if let Some(vnet) = bag.get_str("virtual-network") {
        body.insert("virtualNetwork".into(), Value::String(vnet.to_string()));
    }
    if let Some(ignore) = bag.get_bool("ignore-missing-endpoint") {
        body.insert("ignoreMissingVNetServiceEndpoint".into(), Value::Bool(ignore));
    }
    Value::Object(body)
}

/// Body for database create requests.
pub fn database_body(bag: &ArgumentBag, db: &str) -> Value {
    let mut body = Map::new();
    body.insert("id".into(), Value::String(db.to_string()));
    if let Some(throughput) = bag.get_i64("throughput") {
        body.insert("options".into(), json!({"throughput": throughput}));
    }
    Value::Object(body)
}

/// Body for collection create requests.
pub fn collection_body(bag: &ArgumentBag, coll: &str) -> Value {
    let mut body = Map::new();
    body.insert("id".into(), Value::String(coll.to_string()));
    if let Some(throughput) = bag.get_i64("throughput") {
        body.insert("options".into(), json!({"throughput": throughput}));
    }
    if let Some(path) = bag.get_str("partition-key-path") {
        body.insert("partitionKey".into(), json!({"paths": [path], "kind": "Hash"}));
    }
    if let Some(policy) = bag.get_json("indexing-policy") {
        body.insert("indexingPolicy".into(), policy.clone());
    }
    if let Some(ttl) = bag.get_i64("default-ttl") {
        body.insert("defaultTtl".into(), Value::from(ttl));
    }
    Value::Object(body)
}
