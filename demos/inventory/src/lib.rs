//! Inventory service exposed through rigging
//!
//! Every public method below is registered with the binder. Most of them
//! become actions; a few are registered on purpose to show what the
//! classifier leaves out:
//! - `NotUsed` has no execution context
//! - `Audit` takes four parameters after the context
//! - `Snapshot` returns three values
//! - `name` is not exported

use http::HeaderMap;
use rigging_core::Failure;
use rigging_server::{CallContext, MethodTable, Record, Service};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::debug;

/// Header read by the `Header` action
pub const LAB_HEADER: &str = "x-lab";

/// An inventory item, sent as a request body or returned as a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub name: String,
}

impl Record for InventoryRecord {}

/// Item lookup decoded from the query string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryQuery {
    pub name: String,
}

impl Record for InventoryQuery {}

/// In-memory inventory
#[derive(Debug, Default)]
pub struct Inventory {
    items: RwLock<BTreeMap<String, InventoryRecord>>,
    invocations: AtomicUsize,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of method bodies that have started running
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    fn touch(&self) {
        self.invocations.fetch_add(1, Ordering::SeqCst);
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, InventoryRecord>> {
        self.items.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, InventoryRecord>> {
        self.items.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// POST /inventory/add
    pub async fn add(self: Arc<Self>, _ctx: CallContext, item: InventoryRecord) -> Option<Failure> {
        self.touch();
        debug!(name = %item.name, "Inventory add");

        if item.name.trim().is_empty() {
            return Some(Failure::new(400).with_message("item name is empty"));
        }

        let mut items = self.write();
        if items.contains_key(&item.name) {
            return Some(
                Failure::new(400)
                    .with_message("item already exists")
                    .with_error(item.name),
            );
        }
        items.insert(item.name.clone(), item);
        None
    }

    /// POST /inventory/remove
    pub async fn remove(self: Arc<Self>, _ctx: CallContext, query: InventoryQuery) -> Option<Failure> {
        self.touch();
        debug!(name = %query.name, "Inventory remove");

        match self.write().remove(&query.name) {
            Some(_) => None,
            None => Some(
                Failure::new(404)
                    .with_message("item not found")
                    .with_error(query.name),
            ),
        }
    }

    /// GET /inventory/remove, returning the removed item if there was one
    pub async fn get_remove(
        self: Arc<Self>,
        _ctx: CallContext,
        query: InventoryQuery,
    ) -> Result<Option<Box<InventoryRecord>>, Failure> {
        self.touch();
        debug!(name = %query.name, "Inventory remove (GET)");

        Ok(self.write().remove(&query.name).map(Box::new))
    }

    /// GET /inventory/data
    pub async fn get_data(
        self: Arc<Self>,
        _ctx: CallContext,
        query: InventoryQuery,
    ) -> Result<InventoryRecord, Failure> {
        self.touch();
        debug!(name = %query.name, "Inventory data");

        let stored = self.read().get(&query.name).cloned();
        Ok(stored.unwrap_or(InventoryRecord { name: query.name }))
    }

    /// GET /inventory/empty; gives up early when the request goes away
    pub async fn get_empty(self: Arc<Self>, ctx: CallContext) -> Option<Failure> {
        self.touch();
        tokio::select! {
            _ = ctx.cancelled() => debug!("Inventory empty cancelled"),
            _ = tokio::time::sleep(Duration::from_millis(10)) => debug!("Inventory empty"),
        }
        None
    }

    /// OPTIONS /inventory/empty
    pub async fn options_empty(self: Arc<Self>, _ctx: CallContext) -> Option<Failure> {
        self.touch();
        debug!("Inventory empty (OPTIONS)");
        None
    }

    /// POST /inventory/query with both a query and a body record
    pub async fn query(
        self: Arc<Self>,
        _ctx: CallContext,
        query: InventoryQuery,
        item: Box<InventoryRecord>,
    ) -> Option<Failure> {
        self.touch();
        debug!(query = %query.name, body = %item.name, "Inventory query");
        None
    }

    /// POST /inventory/revert, the same slots declared in reverse order
    pub async fn revert(
        self: Arc<Self>,
        _ctx: CallContext,
        item: Box<InventoryRecord>,
        query: InventoryQuery,
    ) -> Option<Failure> {
        self.touch();
        debug!(query = %query.name, body = %item.name, "Inventory revert");
        None
    }

    /// POST /inventory/header, reading every slot kind
    pub async fn header(
        self: Arc<Self>,
        _ctx: CallContext,
        item: Box<InventoryRecord>,
        query: InventoryQuery,
        headers: HeaderMap,
    ) -> Result<InventoryRecord, Failure> {
        self.touch();

        let Some(lab) = headers.get(LAB_HEADER).and_then(|v| v.to_str().ok()) else {
            return Err(Failure::new(400)
                .with_message("missing header")
                .with_error(LAB_HEADER));
        };
        debug!(query = %query.name, body = %item.name, lab, "Inventory header");

        Ok(InventoryRecord {
            name: format!("{}/{}/{}", item.name, query.name, lab),
        })
    }

    /// POST /inventory/list, every stored item in name order
    pub async fn list(
        self: Arc<Self>,
        _ctx: CallContext,
        item: Box<InventoryRecord>,
        query: InventoryQuery,
    ) -> Result<Vec<InventoryRecord>, Failure> {
        self.touch();
        debug!(query = %query.name, body = %item.name, "Inventory list");

        Ok(self.read().values().cloned().collect())
    }

    /// POST /inventory/crash
    pub async fn crash(self: Arc<Self>, _ctx: CallContext) -> Option<Failure> {
        self.touch();
        panic!("inventory crashed");
    }

    pub async fn not_used(self: Arc<Self>, _label: String) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.touch();
        Ok(())
    }

    pub async fn audit(
        self: Arc<Self>,
        _ctx: CallContext,
        _headers: HeaderMap,
        _query: InventoryQuery,
        _item: InventoryRecord,
        _previous: InventoryRecord,
    ) -> Option<Failure> {
        self.touch();
        None
    }

    pub async fn snapshot(
        self: Arc<Self>,
        _ctx: CallContext,
    ) -> (InventoryRecord, InventoryRecord, Option<Failure>) {
        self.touch();
        let empty = InventoryRecord {
            name: String::new(),
        };
        (empty.clone(), empty, None)
    }

    async fn name(self: Arc<Self>, _ctx: CallContext) -> Option<Failure> {
        self.touch();
        None
    }
}

impl Service for Inventory {
    fn methods(table: &mut MethodTable<Self>) {
        table
            .method("Add", Inventory::add)
            .method("Remove", Inventory::remove)
            .method("GetRemove", Inventory::get_remove)
            .method("GetData", Inventory::get_data)
            .method("GetEmpty", Inventory::get_empty)
            .method("OptionsEmpty", Inventory::options_empty)
            .method("Query", Inventory::query)
            .method("Revert", Inventory::revert)
            .method("Header", Inventory::header)
            .method("List", Inventory::list)
            .method("Crash", Inventory::crash)
            .method("NotUsed", Inventory::not_used)
            .method("Audit", Inventory::audit)
            .method("Snapshot", Inventory::snapshot)
            .method("name", Inventory::name);
    }

    fn version(&self) -> Option<String> {
        Some("v1".to_string())
    }
}
