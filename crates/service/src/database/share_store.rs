use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite};

use common::share::{ExternalShare, ShareStatus, ShareStore, ShareType};
use common::store::StoreError;

use super::{store_error, Database};

#[derive(Debug, sqlx::FromRow)]
struct ShareRow {
    id: i64,
    remote: String,
    share_token: String,
    password: Option<String>,
    name: String,
    owner: String,
    recipient: String,
    share_type: String,
    mount_point: String,
    mount_point_hash: String,
    accepted: bool,
    remote_id: String,
    parent_id: Option<i64>,
}

impl From<ShareRow> for ExternalShare {
    fn from(row: ShareRow) -> Self {
        Self {
            id: row.id,
            remote: row.remote,
            share_token: row.share_token,
            password: row.password,
            name: row.name,
            owner: row.owner,
            recipient: row.recipient,
            share_type: ShareType::from_str(&row.share_type),
            mount_point: row.mount_point,
            mount_point_hash: row.mount_point_hash,
            status: ShareStatus::from(row.accepted),
            remote_id: row.remote_id,
            parent_id: row.parent_id,
        }
    }
}

const SELECT_SHARE: &str = r#"
    SELECT id, remote, share_token, password, name, owner, recipient, share_type,
           mount_point, mount_point_hash, accepted, remote_id, parent_id
    FROM external_shares
"#;

#[async_trait]
impl ShareStore for Database {
    async fn insert(&self, share: ExternalShare) -> Result<ExternalShare, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO external_shares (
                remote, share_token, password, name, owner, recipient, share_type,
                mount_point, mount_point_hash, accepted, remote_id, parent_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&share.remote)
        .bind(&share.share_token)
        .bind(&share.password)
        .bind(&share.name)
        .bind(&share.owner)
        .bind(&share.recipient)
        .bind(share.share_type.as_str())
        .bind(&share.mount_point)
        .bind(&share.mount_point_hash)
        .bind(share.status.is_accepted())
        .bind(&share.remote_id)
        .bind(share.parent_id)
        .execute(&**self)
        .await
        .map_err(store_error)?;

        Ok(ExternalShare {
            id: result.last_insert_rowid(),
            ..share
        })
    }

    async fn get(&self, id: i64) -> Result<Option<ExternalShare>, StoreError> {
        let row = sqlx::query_as::<_, ShareRow>(&format!("{SELECT_SHARE} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&**self)
            .await
            .map_err(store_error)?;
        Ok(row.map(Into::into))
    }

    async fn find_by_mount_point(
        &self,
        recipient: &str,
        mount_point_hash: &str,
    ) -> Result<Option<ExternalShare>, StoreError> {
        let row = sqlx::query_as::<_, ShareRow>(&format!(
            "{SELECT_SHARE} WHERE recipient = ?1 AND mount_point_hash = ?2"
        ))
        .bind(recipient)
        .bind(mount_point_hash)
        .fetch_optional(&**self)
        .await
        .map_err(store_error)?;
        Ok(row.map(Into::into))
    }

    async fn find_member_row(
        &self,
        parent_id: i64,
        user: &str,
    ) -> Result<Option<ExternalShare>, StoreError> {
        let row = sqlx::query_as::<_, ShareRow>(&format!(
            "{SELECT_SHARE} WHERE parent_id = ?1 AND recipient = ?2"
        ))
        .bind(parent_id)
        .bind(user)
        .fetch_optional(&**self)
        .await
        .map_err(store_error)?;
        Ok(row.map(Into::into))
    }

    async fn update_mount(
        &self,
        id: i64,
        mount_point: &str,
        mount_point_hash: &str,
        status: ShareStatus,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE external_shares
            SET mount_point = ?1, mount_point_hash = ?2, accepted = ?3
            WHERE id = ?4
            "#,
        )
        .bind(mount_point)
        .bind(mount_point_hash)
        .bind(status.is_accepted())
        .bind(id)
        .execute(&**self)
        .await
        .map_err(store_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM external_shares WHERE id = ?1")
            .bind(id)
            .execute(&**self)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn list_for(&self, recipients: &[String]) -> Result<Vec<ExternalShare>, StoreError> {
        if recipients.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_SHARE);
        query.push(" WHERE recipient IN (");
        let mut separated = query.separated(", ");
        for recipient in recipients {
            separated.push_bind(recipient);
        }
        separated.push_unseparated(") ORDER BY id");

        let rows = query
            .build_query_as::<ShareRow>()
            .fetch_all(&**self)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_by_recipient(&self, recipient: &str) -> Result<Vec<ExternalShare>, StoreError> {
        let mut tx = self.begin().await.map_err(store_error)?;

        let rows = sqlx::query_as::<_, ShareRow>(&format!(
            r#"{SELECT_SHARE}
            WHERE recipient = ?1
               OR parent_id IN (SELECT id FROM external_shares WHERE recipient = ?1)
            ORDER BY id"#
        ))
        .bind(recipient)
        .fetch_all(&mut *tx)
        .await
        .map_err(store_error)?;

        // member rows go with their template through the foreign key
        sqlx::query("DELETE FROM external_shares WHERE recipient = ?1")
            .bind(recipient)
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::share::mount_point_hash;

    fn share(recipient: &str, mount_point: &str) -> ExternalShare {
        ExternalShare {
            id: 0,
            remote: "https://b.example".to_string(),
            share_token: "tok".to_string(),
            password: Some("pw".to_string()),
            name: "Docs".to_string(),
            owner: "bob".to_string(),
            recipient: recipient.to_string(),
            share_type: ShareType::User,
            mount_point: mount_point.to_string(),
            mount_point_hash: mount_point_hash(mount_point),
            status: ShareStatus::Pending,
            remote_id: "7".to_string(),
            parent_id: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::memory().await.unwrap();
        let stored = db.insert(share("alice", "/Docs")).await.unwrap();
        assert!(stored.id > 0);
        assert_eq!(db.get(stored.id).await.unwrap(), Some(stored.clone()));
        assert_eq!(
            db.find_by_mount_point("alice", &mount_point_hash("/Docs"))
                .await
                .unwrap(),
            Some(stored)
        );
    }

    #[tokio::test]
    async fn test_unique_mount_point_per_recipient() {
        let db = Database::memory().await.unwrap();
        db.insert(share("alice", "/Docs")).await.unwrap();
        assert_eq!(
            db.insert(share("alice", "/Docs")).await,
            Err(StoreError::Conflict)
        );
        db.insert(share("carol", "/Docs")).await.unwrap();

        let other = db.insert(share("alice", "/Other")).await.unwrap();
        assert_eq!(
            db.update_mount(
                other.id,
                "/Docs",
                &mount_point_hash("/Docs"),
                ShareStatus::Accepted
            )
            .await,
            Err(StoreError::Conflict)
        );
        let unchanged = db.get(other.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, ShareStatus::Pending);
    }

    #[tokio::test]
    async fn test_list_for_orders_by_id() {
        let db = Database::memory().await.unwrap();
        let a = db.insert(share("alice", "/a")).await.unwrap();
        db.insert(share("carol", "/b")).await.unwrap();
        let c = db.insert(share("research-group", "/c")).await.unwrap();

        let listed = db
            .list_for(&["research-group".to_string(), "alice".to_string()])
            .await
            .unwrap();
        assert_eq!(
            listed.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![a.id, c.id]
        );
        assert!(db.list_for(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_one_member_row_per_template() {
        let db = Database::memory().await.unwrap();
        let mut template = share("research-group", "/t");
        template.share_type = ShareType::Group;
        let template = db.insert(template).await.unwrap();

        let mut member = share("alice", "/Docs");
        member.share_type = ShareType::Group;
        member.parent_id = Some(template.id);
        db.insert(member.clone()).await.unwrap();

        let mut second = member;
        second.mount_point = "/Docs (2)".to_string();
        second.mount_point_hash = mount_point_hash("/Docs (2)");
        assert_eq!(db.insert(second).await, Err(StoreError::Conflict));

        // rows without a parent never collide on the member index
        db.insert(share("alice", "/Other")).await.unwrap();
        db.insert(share("alice", "/More")).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_by_recipient_cascades() {
        let db = Database::memory().await.unwrap();
        let mut template = share("research-group", "/t");
        template.share_type = ShareType::Group;
        let template = db.insert(template).await.unwrap();

        let mut member = share("alice", "/Docs");
        member.share_type = ShareType::Group;
        member.parent_id = Some(template.id);
        let member = db.insert(member).await.unwrap();
        let own = db.insert(share("alice", "/Own")).await.unwrap();

        let removed = db.delete_by_recipient("research-group").await.unwrap();
        assert_eq!(removed.len(), 2);
        assert!(db.get(member.id).await.unwrap().is_none());
        assert!(db.get(own.id).await.unwrap().is_some());
    }
}
