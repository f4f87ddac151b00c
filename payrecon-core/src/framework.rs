use sqlx::PgPool;

/// Executes SQL command objects (`kanau::processor::Processor` impls in
/// [`crate::entities`]) against the connection pool.
#[derive(Debug, Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}

impl DatabaseProcessor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}
