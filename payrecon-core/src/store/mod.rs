//! Persistence boundary for invoice records.
//!
//! Every mutating method is an atomic read-modify-write on a single record:
//! concurrent callers for the same record are serialized and each sees the
//! result of the previous one.

mod memory;
mod postgres;

pub use memory::MemoryRecordStore;
pub use postgres::PgRecordStore;

use crate::entities::invoice_records::{
    InvoiceRecord, InvoiceTransition, ListInvoiceRecords, TransferClaim, TransferTransition,
};
use crate::entities::{InvoiceStatus, TransferStatus};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique key (invoice id or transfer id) is already taken.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        let duplicate = e
            .as_database_error()
            .filter(|db| db.is_unique_violation())
            .map(|db| db.message().to_owned());
        match duplicate {
            Some(message) => StoreError::DuplicateKey(message),
            None => StoreError::Database(e),
        }
    }
}

#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a new record. Returns `false` if the invoice id already exists.
    async fn insert(&self, record: InvoiceRecord) -> Result<bool, StoreError>;

    async fn get_by_invoice_id(&self, invoice_id: &str)
    -> Result<Option<InvoiceRecord>, StoreError>;

    /// Look up the record owning a provider transfer id. Empty ids never match.
    async fn get_by_transfer_id(
        &self,
        transfer_id: &str,
    ) -> Result<Option<InvoiceRecord>, StoreError>;

    async fn list(&self, query: ListInvoiceRecords) -> Result<Vec<InvoiceRecord>, StoreError>;

    /// Move the invoice status forward. `None` means no such record.
    async fn advance_invoice_status(
        &self,
        invoice_id: &str,
        target: InvoiceStatus,
        claim: Option<TransferClaim>,
    ) -> Result<Option<InvoiceTransition>, StoreError>;

    /// Move the transfer status of the record owning `transfer_id` forward.
    async fn advance_transfer_status(
        &self,
        transfer_id: &str,
        target: TransferStatus,
    ) -> Result<Option<TransferTransition>, StoreError>;

    /// Link an issued transfer to its invoice. Returns the updated record, or
    /// `None` if the record is missing, already linked, or holds a different
    /// idempotency token. Fails with [`StoreError::DuplicateKey`] if the
    /// transfer id already belongs to another invoice.
    async fn record_transfer_issued(
        &self,
        invoice_id: &str,
        transfer_id: &str,
        internal_transfer_id: &str,
    ) -> Result<Option<InvoiceRecord>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_constraint_errors_stay_database_errors() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database(sqlx::Error::RowNotFound)));

        let err = StoreError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Database(_)));
    }
}
