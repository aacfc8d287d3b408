use super::helpers::fetch_account;
use super::Engine;

use async_trait::async_trait;
use sqlx::{types::Json, Acquire, Executor, Row};
use uuid::Uuid;

use crate::{
    api::AccountAPI,
    auth::User,
    entities::{Account, AccountStatus},
    error::Error,
};

#[async_trait]
impl AccountAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn find_account(&self, user: User, id: Uuid) -> Result<Account, Error> {
        let mut conn = self.pool.acquire().await?;

        let maybe_result = conn
            .fetch_optional(sqlx::query("SELECT data FROM accounts WHERE id = $1").bind(&id))
            .await?;

        let account = match maybe_result {
            Some(result) => {
                let Json(account): Json<Account> = result.try_get("data")?;
                account
            }
            None => Account::new(id),
        };

        self.authorize(user.clone(), "read", account.clone())?;

        Ok(account)
    }

    #[tracing::instrument(skip(self))]
    async fn set_account_status(
        &self,
        user: User,
        id: Uuid,
        status: AccountStatus,
    ) -> Result<Account, Error> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut account = fetch_account(&mut tx, &id).await?;

        self.authorize(user.clone(), "set_status", account.clone())?;

        account.set_status(status);

        // rows are created lazily, on the first standing change
        tx.execute(
            sqlx::query(
                "INSERT INTO accounts (id, status, data) VALUES ($1, $2, $3) ON CONFLICT (id) DO UPDATE SET status = EXCLUDED.status, data = EXCLUDED.data",
            )
            .bind(&account.id)
            .bind(account.status.name())
            .bind(Json(&account)),
        )
        .await?;

        tx.commit().await?;

        Ok(account)
    }
}
