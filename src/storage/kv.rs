use super::schema::Database;
use super::types::StorageError;

impl Database {
    // ========================================================================
    // Key-Value Operations
    // ========================================================================

    /// Get a single value by key.
    ///
    /// # Returns
    ///
    /// The stored value if the key exists, or `None` if it was never written.
    pub async fn get_value(&self, key: &str) -> Result<Option<String>, StorageError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from_sqlx)?;

        Ok(row.map(|(value,)| value))
    }

    /// Set a value (UPSERT), fully replacing any previous value.
    ///
    /// # Errors
    ///
    /// Any failure is reported as [`StorageError::Write`]; the previous value
    /// stays in place.
    pub async fn put_value(&self, key: &str, value: &str) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Write {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        Ok(())
    }

    /// All keys starting with `prefix`, ordered by key.
    pub async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        // instr() instead of LIKE: city names may contain `_` or `%`
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT key FROM kv_store WHERE instr(key, ?) = 1 ORDER BY key")
                .bind(prefix)
                .fetch_all(&self.pool)
                .await
                .map_err(StorageError::from_sqlx)?;

        Ok(rows.into_iter().map(|(key,)| key).collect())
    }
}
