/// Catalog layer: CKAN action API, payload types, and session memoization.
///
/// ```text
///   CkanClient (blocking HTTP, 30 s timeout)
///        │
///        ▼
///   CachedCatalog ◄── Rc<ResponseCache>   memo per exact request
///        │
///        ▼
///   &dyn CatalogApi  → data::loader
/// ```

pub mod cache;
pub mod client;
pub mod model;
