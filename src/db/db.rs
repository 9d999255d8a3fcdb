// db/db.rs
use sqlx::{Pool, Postgres};

use crate::service::retry::RetryPolicy;

#[derive(Clone)]
pub struct DBClient {
    pub pool: Pool<Postgres>,
    pub retry_policy: RetryPolicy,
}

impl std::fmt::Debug for DBClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DBClient")
            .field("pool", &"Pool<Postgres>")
            .field("retry_policy", &self.retry_policy)
            .finish()
    }
}

impl DBClient {
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient {
            pool,
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(pool: Pool<Postgres>, retry_policy: RetryPolicy) -> Self {
        DBClient { pool, retry_policy }
    }
}
