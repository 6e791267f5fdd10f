use async_trait::async_trait;
use time::OffsetDateTime;

use common::handshake::{HandshakePayload, RetryQueue, RetryTask};
use common::store::StoreError;

use super::{store_error, Database};

#[derive(Debug, sqlx::FromRow)]
struct RetryTaskRow {
    target_host: String,
    token: String,
    payload: String,
    retry_count: i64,
    last_run_at: Option<i64>,
}

impl TryFrom<RetryTaskRow> for RetryTask {
    type Error = StoreError;

    fn try_from(row: RetryTaskRow) -> Result<Self, Self::Error> {
        let payload: HandshakePayload = serde_json::from_str(&row.payload)
            .map_err(|e| StoreError::Provider(format!("corrupt task payload: {}", e)))?;
        let last_run_at = row
            .last_run_at
            .map(OffsetDateTime::from_unix_timestamp)
            .transpose()
            .map_err(|e| StoreError::Provider(format!("corrupt task timestamp: {}", e)))?;

        Ok(Self {
            target_host: row.target_host,
            token: row.token,
            payload,
            retry_count: u32::try_from(row.retry_count).unwrap_or(u32::MAX),
            last_run_at,
        })
    }
}

const SELECT_TASK: &str = r#"
    SELECT target_host, token, payload, retry_count, last_run_at
    FROM retry_tasks
"#;

#[async_trait]
impl RetryQueue for Database {
    async fn enqueue(&self, task: RetryTask) -> Result<RetryTask, StoreError> {
        let payload = serde_json::to_string(&task.payload)
            .map_err(|e| StoreError::Provider(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO retry_tasks (target_host, token, payload, retry_count, last_run_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (target_host, token) DO NOTHING
            "#,
        )
        .bind(&task.target_host)
        .bind(&task.token)
        .bind(payload)
        .bind(i64::from(task.retry_count))
        .bind(task.last_run_at.map(OffsetDateTime::unix_timestamp))
        .execute(&**self)
        .await
        .map_err(store_error)?;

        self.get(&task.target_host, &task.token)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn get(&self, target_host: &str, token: &str) -> Result<Option<RetryTask>, StoreError> {
        let row = sqlx::query_as::<_, RetryTaskRow>(&format!(
            "{SELECT_TASK} WHERE target_host = ?1 AND token = ?2"
        ))
        .bind(target_host)
        .bind(token)
        .fetch_optional(&**self)
        .await
        .map_err(store_error)?;
        row.map(RetryTask::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<RetryTask>, StoreError> {
        let rows = sqlx::query_as::<_, RetryTaskRow>(&format!(
            "{SELECT_TASK} ORDER BY target_host, token"
        ))
        .fetch_all(&**self)
        .await
        .map_err(store_error)?;
        rows.into_iter().map(RetryTask::try_from).collect()
    }

    async fn reschedule(
        &self,
        target_host: &str,
        token: &str,
        expected_retry_count: u32,
        ran_at: OffsetDateTime,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE retry_tasks
            SET retry_count = retry_count + 1, last_run_at = ?1
            WHERE target_host = ?2 AND token = ?3 AND retry_count = ?4
            "#,
        )
        .bind(ran_at.unix_timestamp())
        .bind(target_host)
        .bind(token)
        .bind(i64::from(expected_retry_count))
        .execute(&**self)
        .await
        .map_err(store_error)?;
        Ok(result.rows_affected() == 1)
    }

    async fn remove(&self, target_host: &str, token: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM retry_tasks WHERE target_host = ?1 AND token = ?2")
            .bind(target_host)
            .bind(token)
            .execute(&**self)
            .await
            .map_err(store_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn epoch_plus(secs: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(secs).unwrap()
    }

    #[tokio::test]
    async fn test_enqueue_keeps_existing_task() {
        let db = Database::memory().await.unwrap();
        let first = db
            .enqueue(RetryTask::new("https://b.example", "tok", epoch_plus(10)))
            .await
            .unwrap();
        let second = db
            .enqueue(RetryTask::new("https://b.example/", "tok", epoch_plus(20)))
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(second.payload.created, 10);
        assert_eq!(db.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reschedule_is_conditional() {
        let db = Database::memory().await.unwrap();
        db.enqueue(RetryTask::new("https://b.example", "tok", epoch_plus(0)))
            .await
            .unwrap();

        assert!(db
            .reschedule("https://b.example", "tok", 0, epoch_plus(100))
            .await
            .unwrap());
        // a second worker holding the stale count loses
        assert!(!db
            .reschedule("https://b.example", "tok", 0, epoch_plus(101))
            .await
            .unwrap());

        let task = db.get("https://b.example", "tok").await.unwrap().unwrap();
        assert_eq!(task.retry_count, 1);
        assert_eq!(task.last_run_at, Some(epoch_plus(100)));

        db.remove("https://b.example", "tok").await.unwrap();
        db.remove("https://b.example", "tok").await.unwrap();
        assert!(db.list().await.unwrap().is_empty());
    }
}
