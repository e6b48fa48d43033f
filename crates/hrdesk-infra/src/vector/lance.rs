//! LanceDB connection wrapper for the corpus store.
//!
//! Provides `LanceCorpusDb`, which wraps a `lancedb::Connection` and offers
//! helper methods for table lifecycle (create, open, drop) using Arrow
//! schemas. The retrieval semantics live in [`super::corpus`].

use std::path::PathBuf;
use std::sync::Arc;

use arrow_schema::Schema;

/// LanceDB connection and table management for the HR corpus.
pub struct LanceCorpusDb {
    db: lancedb::Connection,
    base_path: PathBuf,
}

impl LanceCorpusDb {
    /// Open or create a LanceDB store at the given path.
    ///
    /// Creates the directory if it does not exist.
    pub async fn new(base_path: PathBuf) -> Result<Self, lancedb::Error> {
        std::fs::create_dir_all(&base_path).map_err(|e| lancedb::Error::CreateDir {
            path: base_path.display().to_string(),
            source: e,
        })?;

        let uri = base_path
            .to_str()
            .ok_or_else(|| lancedb::Error::InvalidInput {
                message: format!("Path contains invalid UTF-8: {}", base_path.display()),
            })?;

        let db = lancedb::connect(uri).execute().await?;

        Ok(Self { db, base_path })
    }

    /// Ensure a table exists with the given schema.
    ///
    /// If the table already exists, opens it. If not, creates an empty table
    /// with the provided schema.
    pub async fn ensure_table(
        &self,
        table_name: &str,
        schema: Arc<Schema>,
    ) -> Result<lancedb::Table, lancedb::Error> {
        match self.db.open_table(table_name).execute().await {
            Ok(table) => Ok(table),
            Err(lancedb::Error::TableNotFound { .. }) => {
                self.db
                    .create_empty_table(table_name, schema)
                    .execute()
                    .await
            }
            Err(e) => Err(e),
        }
    }

    /// Check if a table exists in the database.
    pub async fn table_exists(&self, table_name: &str) -> bool {
        self.db.open_table(table_name).execute().await.is_ok()
    }

    /// Drop a table. Returns Ok(()) even if it does not exist (idempotent).
    pub async fn drop_table(&self, table_name: &str) -> Result<(), lancedb::Error> {
        match self.db.drop_table(table_name, &[]).await {
            Ok(()) => Ok(()),
            Err(lancedb::Error::TableNotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// List all table names in the database.
    pub async fn table_names(&self) -> Result<Vec<String>, lancedb::Error> {
        self.db.table_names().execute().await
    }

    /// Get a reference to the underlying LanceDB connection.
    pub fn connection(&self) -> &lancedb::Connection {
        &self.db
    }

    /// Get the base path of the store.
    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    /// Name of the corpus fragments table.
    pub fn corpus_table_name() -> &'static str {
        "corpus_fragments"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::schema::corpus_fragments_schema;

    #[tokio::test]
    async fn test_connection_opens_successfully() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = LanceCorpusDb::new(temp_dir.path().to_path_buf())
            .await
            .expect("Failed to create corpus db");

        let tables = store.table_names().await.expect("Failed to list tables");
        assert!(tables.is_empty());
    }

    #[tokio::test]
    async fn test_ensure_table_creates_and_reopens() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = LanceCorpusDb::new(temp_dir.path().to_path_buf())
            .await
            .expect("Failed to create corpus db");

        let schema = Arc::new(corpus_fragments_schema());

        let table = store
            .ensure_table(LanceCorpusDb::corpus_table_name(), schema.clone())
            .await
            .expect("Failed to create table");

        let count = table.count_rows(None).await.expect("Failed to count rows");
        assert_eq!(count, 0);

        // Second call opens the existing table
        let _table2 = store
            .ensure_table(LanceCorpusDb::corpus_table_name(), schema)
            .await
            .expect("Failed to reopen table");
    }

    #[tokio::test]
    async fn test_drop_table_idempotent() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = LanceCorpusDb::new(temp_dir.path().to_path_buf())
            .await
            .expect("Failed to create corpus db");

        let schema = Arc::new(corpus_fragments_schema());
        store
            .ensure_table("to_drop", schema)
            .await
            .expect("Failed to create table");

        assert!(store.table_exists("to_drop").await);

        store.drop_table("to_drop").await.expect("Failed to drop");
        assert!(!store.table_exists("to_drop").await);

        store
            .drop_table("to_drop")
            .await
            .expect("Second drop should be idempotent");
    }
}
