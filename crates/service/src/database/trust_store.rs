use async_trait::async_trait;

use common::cloud_id::host_key;
use common::store::StoreError;
use common::trust::{TrustStatus, TrustStore, TrustedHost};

use super::{store_error, Database};

#[derive(Debug, sqlx::FromRow)]
struct TrustedHostRow {
    id: i64,
    url: String,
    host_key: String,
    shared_secret: Option<String>,
    status: String,
    pending_token: Option<String>,
}

impl From<TrustedHostRow> for TrustedHost {
    fn from(row: TrustedHostRow) -> Self {
        Self {
            id: row.id,
            url: row.url,
            host_key: row.host_key,
            shared_secret: row.shared_secret,
            status: TrustStatus::from_str(&row.status),
            pending_token: row.pending_token,
        }
    }
}

const SELECT_HOST: &str = r#"
    SELECT id, url, host_key, shared_secret, status, pending_token
    FROM trusted_hosts
"#;

/// Fail with `NotFound` when an update touched nothing
fn expect_row(result: sqlx::sqlite::SqliteQueryResult) -> Result<(), StoreError> {
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

#[async_trait]
impl TrustStore for Database {
    async fn add(&self, url: &str) -> Result<TrustedHost, StoreError> {
        let key = host_key(url);
        sqlx::query(
            r#"
            INSERT INTO trusted_hosts (url, host_key, status)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (host_key) DO NOTHING
            "#,
        )
        .bind(url.trim())
        .bind(&key)
        .bind(TrustStatus::New.as_str())
        .execute(&**self)
        .await
        .map_err(store_error)?;

        self.get(&key).await?.ok_or(StoreError::NotFound)
    }

    async fn get(&self, host: &str) -> Result<Option<TrustedHost>, StoreError> {
        let row = sqlx::query_as::<_, TrustedHostRow>(&format!("{SELECT_HOST} WHERE host_key = ?1"))
            .bind(host_key(host))
            .fetch_optional(&**self)
            .await
            .map_err(store_error)?;
        Ok(row.map(Into::into))
    }

    async fn list(&self) -> Result<Vec<TrustedHost>, StoreError> {
        let rows = sqlx::query_as::<_, TrustedHostRow>(&format!("{SELECT_HOST} ORDER BY id"))
            .fetch_all(&**self)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn remove(&self, host: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM trusted_hosts WHERE host_key = ?1")
            .bind(host_key(host))
            .execute(&**self)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn set_secret(&self, host: &str, secret: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE trusted_hosts
            SET shared_secret = ?1, status = ?2, pending_token = NULL
            WHERE host_key = ?3
            "#,
        )
        .bind(secret)
        .bind(TrustStatus::Ok.as_str())
        .bind(host_key(host))
        .execute(&**self)
        .await
        .map_err(store_error)?;
        expect_row(result)
    }

    async fn set_status(&self, host: &str, status: TrustStatus) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE trusted_hosts
            SET status = ?1,
                shared_secret = CASE WHEN ?1 = 'ok' THEN shared_secret ELSE NULL END
            WHERE host_key = ?2
            "#,
        )
        .bind(status.as_str())
        .bind(host_key(host))
        .execute(&**self)
        .await
        .map_err(store_error)?;
        expect_row(result)
    }

    async fn set_pending_token(&self, host: &str, token: Option<&str>) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE trusted_hosts SET pending_token = ?1 WHERE host_key = ?2")
            .bind(token)
            .bind(host_key(host))
            .execute(&**self)
            .await
            .map_err(store_error)?;
        expect_row(result)
    }
}
