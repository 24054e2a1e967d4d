//! Service objects exposed as HTTP actions

use crate::method::MethodTable;

/// A service whose registered methods become HTTP actions
///
/// The resource segment of every route is the lower-cased type name; the
/// action segment and verb come from each method's registered name.
///
/// ```ignore
/// impl Service for Inventory {
///     fn methods(table: &mut MethodTable<Self>) {
///         table
///             .method("Add", Inventory::add)
///             .method("GetData", Inventory::get_data);
///     }
///
///     fn version(&self) -> Option<String> {
///         Some("v2".to_string())
///     }
/// }
/// ```
pub trait Service: Send + Sync + Sized + 'static {
    /// Register every method that should be considered for binding
    fn methods(table: &mut MethodTable<Self>);

    /// Version segment for this service's routes
    ///
    /// Whitespace is removed; `None` or an empty result falls back to the
    /// configured default.
    fn version(&self) -> Option<String> {
        None
    }
}
