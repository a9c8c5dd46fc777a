
use arena_backend::adapters::SeaStore;
use arena_backend::infra::db::bootstrap_db;

/// Fresh, migrated in-memory SQLite store.
pub async fn sqlite_store() -> SeaStore {
    let db = bootstrap_db("sqlite::memory:")
        .await
        .expect("in-memory SQLite should migrate");
    SeaStore::new(db)
}
