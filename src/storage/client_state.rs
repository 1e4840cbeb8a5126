use anyhow::Result;

use super::schema::Database;

impl Database {
    // ========================================================================
    // Client State Operations
    // ========================================================================

    /// Get a single stored value by key.
    ///
    /// Keys use dotted convention: `auth.token`, `auth.user`.
    pub async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM client_state WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(value,)| value))
    }

    /// Store a value (UPSERT), refreshing its timestamp.
    pub async fn set_value(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO client_state (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete the given keys in one transaction. Missing keys are ignored.
    pub async fn delete_values(&self, keys: &[&str]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for key in keys {
            sqlx::query("DELETE FROM client_state WHERE key = ?")
                .bind(key)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Store several values atomically, so related keys never diverge on disk.
    pub async fn set_values(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for (key, value) in entries {
            sqlx::query(
                r#"
                INSERT INTO client_state (key, value, updated_at)
                VALUES (?, ?, datetime('now'))
                ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            )
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::Database;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_get_value_missing() {
        let db = test_db().await;
        let value = db.get_value("auth.token").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_set_and_get_value() {
        let db = test_db().await;
        db.set_value("auth.token", "abc").await.unwrap();

        let value = db.get_value("auth.token").await.unwrap();
        assert_eq!(value, Some("abc".to_string()));
    }

    #[tokio::test]
    async fn test_set_value_upsert() {
        let db = test_db().await;
        db.set_value("auth.token", "abc").await.unwrap();
        db.set_value("auth.token", "def").await.unwrap();

        let value = db.get_value("auth.token").await.unwrap();
        assert_eq!(value, Some("def".to_string()));
    }

    #[tokio::test]
    async fn test_set_values_and_delete_values() {
        let db = test_db().await;
        db.set_values(&[("auth.token", "t"), ("auth.user", "{}")])
            .await
            .unwrap();
        assert_eq!(db.get_value("auth.user").await.unwrap(), Some("{}".to_string()));

        db.delete_values(&["auth.token", "auth.user", "never.set"])
            .await
            .unwrap();
        assert_eq!(db.get_value("auth.token").await.unwrap(), None);
        assert_eq!(db.get_value("auth.user").await.unwrap(), None);
    }
}
