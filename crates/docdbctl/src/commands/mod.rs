//! Command bindings
//!
//! Binds every runnable scope to a management-plane operation. The
//! operations here only translate a validated bag into a client call; all
//! validation happened in the binder and all transport behavior lives in the
//! client.

pub mod body;

use async_trait::async_trait;
use serde_json::Value;

use docdbctl_core::{AccountClient, ArgumentBag, Dispatcher, Operation, RestError};

/// The management-plane call a scope is bound to.
#[derive(Debug, Clone, Copy)]
enum OpKind {
    AccountList,
    AccountShow,
    AccountCreate,
    AccountUpdate,
    AccountDelete,
    KeysList,
    RegenerateKey,
    FailoverPriorityChange,
    NetworkRuleList,
    NetworkRuleAdd,
    NetworkRuleRemove,
    DatabaseList,
    DatabaseCreate,
    DatabaseShow,
    DatabaseDelete,
    CollectionList,
    CollectionCreate,
    CollectionShow,
    CollectionDelete,
}

struct ClientOp {
    client: AccountClient,
    kind: OpKind,
}

/// The binder guarantees required flags are present; this guard turns a
/// violated invariant into a 400-shaped error instead of a panic.
fn required<'a>(bag: &'a ArgumentBag, flag: &str) -> Result<&'a str, RestError> {
    bag.get_str(flag).ok_or_else(|| RestError::ApiError {
        code: 400,
        message: format!("missing required --{}", flag),
    })
}

#[async_trait]
impl Operation for ClientOp {
    async fn invoke(&self, bag: ArgumentBag) -> Result<Value, RestError> {
        let client = &self.client;
        match self.kind {
            OpKind::AccountList => client.list_accounts().await,
            OpKind::AccountShow => client.get_account(required(&bag, "name")?).await,
            OpKind::AccountCreate => {
                let name = required(&bag, "name")?.to_string();
                client.create_account(&name, body::account_body(&bag)).await
            }
            OpKind::AccountUpdate => {
                let name = required(&bag, "name")?.to_string();
                client.update_account(&name, body::account_body(&bag)).await
            }
            OpKind::AccountDelete => client.delete_account(required(&bag, "name")?).await,
            OpKind::KeysList => client.list_keys(required(&bag, "name")?).await,
            OpKind::RegenerateKey => {
                let name = required(&bag, "name")?.to_string();
                let kind = required(&bag, "key-kind")?.to_string();
                client.regenerate_key(&name, &kind).await
            }
            OpKind::FailoverPriorityChange => {
                let name = required(&bag, "name")?.to_string();
                client
                    .change_failover_priorities(&name, body::failover_policies(&bag))
                    .await
            }
            OpKind::NetworkRuleList => client.list_network_rules(required(&bag, "name")?).await,
            OpKind::NetworkRuleAdd => {
                let name = required(&bag, "name")?.to_string();
                client
                    .add_network_rule(&name, body::network_rule_body(&bag))
                    .await
            }
            OpKind::NetworkRuleRemove => {
                let name = required(&bag, "name")?.to_string();
                client
                    .remove_network_rule(&name, body::network_rule_body(&bag))
                    .await
            }
            OpKind::DatabaseList => client.list_databases(required(&bag, "name")?).await,
            OpKind::DatabaseCreate => {
                let account = required(&bag, "name")?.to_string();
                let db = required(&bag, "db-name")?.to_string();
                client
                    .create_database(&account, &db, body::database_body(&bag, &db))
                    .await
            }
            OpKind::DatabaseShow => {
                let account = required(&bag, "name")?.to_string();
                let db = required(&bag, "db-name")?.to_string();
                client.get_database(&account, &db).await
            }
            OpKind::DatabaseDelete => {
                let account = required(&bag, "name")?.to_string();
                let db = required(&bag, "db-name")?.to_string();
                client.delete_database(&account, &db).await
            }
            OpKind::CollectionList => {
                let account = required(&bag, "name")?.to_string();
                let db = required(&bag, "db-name")?.to_string();
                client.list_collections(&account, &db).await
            }
            OpKind::CollectionCreate => {
                let account = required(&bag, "name")?.to_string();
                let db = required(&bag, "db-name")?.to_string();
                let coll = required(&bag, "collection-name")?.to_string();
                client
                    .create_collection(&account, &db, &coll, body::collection_body(&bag, &coll))
                    .await
            }
            OpKind::CollectionShow => {
                let account = required(&bag, "name")?.to_string();
                let db = required(&bag, "db-name")?.to_string();
                let coll = required(&bag, "collection-name")?.to_string();
                client.get_collection(&account, &db, &coll).await
            }
            OpKind::CollectionDelete => {
                let account = required(&bag, "name")?.to_string();
                let db = required(&bag, "db-name")?.to_string();
                let coll = required(&bag, "collection-name")?.to_string();
                client.delete_collection(&account, &db, &coll).await
            }
        }
    }
}

/// Bind every runnable scope to its client operation.
pub fn build_dispatcher(client: AccountClient) -> Dispatcher {
    let mut dispatcher = Dispatcher::new();
    let bindings: [(&str, OpKind); 19] = [
        ("account list", OpKind::AccountList),
        ("account show", OpKind::AccountShow),
        ("account create", OpKind::AccountCreate),
        ("account update", OpKind::AccountUpdate),
        ("account delete", OpKind::AccountDelete),
        ("account keys list", OpKind::KeysList),
        ("account regenerate-key", OpKind::RegenerateKey),
        ("account failover-priority-change", OpKind::FailoverPriorityChange),
        ("account network-rule list", OpKind::NetworkRuleList),
        ("account network-rule add", OpKind::NetworkRuleAdd),
        ("account network-rule remove", OpKind::NetworkRuleRemove),
        ("database list", OpKind::DatabaseList),
        ("database create", OpKind::DatabaseCreate),
        ("database show", OpKind::DatabaseShow),
        ("database delete", OpKind::DatabaseDelete),
        ("collection list", OpKind::CollectionList),
        ("collection create", OpKind::CollectionCreate),
        ("collection show", OpKind::CollectionShow),
        ("collection delete", OpKind::CollectionDelete),
    ];
    for (path, kind) in bindings {
        dispatcher.bind(
            path,
            Box::new(ClientOp {
                client: client.clone(),
                kind,
            }),
        );
    }
    dispatcher
}
