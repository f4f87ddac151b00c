use crate::entities::{InvoiceStatus, TransferStatus};
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use time::OffsetDateTime;

const SELECT_COLUMNS: &str = "invoice_id, invoice_status, transfer_id, internal_transfer_id, \
     transfer_status, transfer_amount, created_at, updated_at";

/// One row per invoice, keyed by the provider-assigned invoice id.
///
/// `transfer_id` and `internal_transfer_id` are empty strings until a
/// transfer has been issued; `transfer_amount` is zero until the invoice is
/// paid.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct InvoiceRecord {
    pub invoice_id: String,
    pub invoice_status: InvoiceStatus,
    pub transfer_id: String,
    pub internal_transfer_id: String,
    pub transfer_status: TransferStatus,
    pub transfer_amount: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Reservation of the outbound transfer, attached to the move into `Paid`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferClaim {
    /// Fresh idempotency token for the transfer request.
    pub internal_transfer_id: String,
    /// Net amount (`amount - fee`) in minor units.
    pub transfer_amount: i64,
}

/// Result of an invoice status change attempt on an existing record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceTransition {
    pub previous: InvoiceStatus,
    /// The record after the change (unchanged when `applied` is false).
    pub record: InvoiceRecord,
    pub applied: bool,
    /// True only for the single change that moved the record into `Paid`
    /// and stored the [`TransferClaim`].
    pub claimed: bool,
}

/// Result of a transfer status change attempt on an existing record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTransition {
    pub previous: TransferStatus,
    pub record: InvoiceRecord,
    pub applied: bool,
}

impl InvoiceRecord {
    /// A record with every field at its zero value except the id and status.
    pub fn new(invoice_id: impl Into<String>, invoice_status: InvoiceStatus) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            invoice_id: invoice_id.into(),
            invoice_status,
            transfer_id: String::new(),
            internal_transfer_id: String::new(),
            transfer_status: TransferStatus::Unrequested,
            transfer_amount: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Seed record for an invoice the provider just confirmed.
    pub fn requested(invoice_id: impl Into<String>) -> Self {
        Self::new(invoice_id, InvoiceStatus::Requested)
    }

    /// Paid, but no transfer has been recorded against it yet.
    pub fn is_awaiting_transfer(&self) -> bool {
        self.invoice_status == InvoiceStatus::Paid
            && self.transfer_status == TransferStatus::Unrequested
            && self.transfer_id.is_empty()
    }

    /// Apply an invoice status change in place.
    ///
    /// The claim is stored only when this change is the one that moves the
    /// record into `Paid` and no idempotency token has been stored before.
    pub fn apply_invoice_status(
        &mut self,
        target: InvoiceStatus,
        claim: Option<&TransferClaim>,
        now: OffsetDateTime,
    ) -> InvoiceTransition {
        let previous = self.invoice_status;
        let applied = previous.can_advance_to(target);
        let mut claimed = false;

        if applied {
            self.invoice_status = target;
            self.updated_at = now;
            if let Some(claim) = claim
                && target == InvoiceStatus::Paid
                && self.internal_transfer_id.is_empty()
            {
                self.internal_transfer_id = claim.internal_transfer_id.clone();
                self.transfer_amount = claim.transfer_amount;
                claimed = true;
            }
        }

        InvoiceTransition {
            previous,
            record: self.clone(),
            applied,
            claimed,
        }
    }

    /// Apply a transfer status change in place.
    pub fn apply_transfer_status(
        &mut self,
        target: TransferStatus,
        now: OffsetDateTime,
    ) -> TransferTransition {
        let previous = self.transfer_status;
        let applied = previous.can_advance_to(target);
        if applied {
            self.transfer_status = target;
            self.updated_at = now;
        }
        TransferTransition {
            previous,
            record: self.clone(),
            applied,
        }
    }

    /// Link the provider's transfer id to this record.
    ///
    /// Succeeds once: the record must still await its transfer and the token
    /// must be the one claimed when the invoice was paid.
    pub fn apply_transfer_issued(
        &mut self,
        transfer_id: &str,
        internal_transfer_id: &str,
        now: OffsetDateTime,
    ) -> bool {
        if transfer_id.is_empty()
            || !self.is_awaiting_transfer()
            || self.internal_transfer_id != internal_transfer_id
        {
            return false;
        }
        self.transfer_id = transfer_id.to_owned();
        self.transfer_status = TransferStatus::Requested;
        self.updated_at = now;
        true
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Insert a record unless one with the same invoice id exists.
///
/// Returns whether a row was inserted.
#[derive(Debug, Clone)]
pub struct InsertInvoiceRecord {
    pub record: InvoiceRecord,
}

#[derive(Debug, Clone)]
pub struct GetInvoiceRecordById {
    pub invoice_id: String,
}

/// Secondary lookup. An empty transfer id never matches.
#[derive(Debug, Clone)]
pub struct GetInvoiceRecordByTransferId {
    pub transfer_id: String,
}

/// List records, newest first, with optional status filters.
#[derive(Debug, Clone)]
pub struct ListInvoiceRecords {
    pub limit: i64,
    pub offset: i64,
    pub invoice_status: Option<InvoiceStatus>,
    pub transfer_status: Option<TransferStatus>,
    /// Only records whose `updated_at` is strictly earlier.
    pub updated_before: Option<OffsetDateTime>,
}

/// Atomically move one record's invoice status forward.
#[derive(Debug, Clone)]
pub struct AdvanceInvoiceStatus {
    pub invoice_id: String,
    pub target: InvoiceStatus,
    pub claim: Option<TransferClaim>,
}

/// Atomically move the transfer status of the record owning `transfer_id`.
#[derive(Debug, Clone)]
pub struct AdvanceTransferStatus {
    pub transfer_id: String,
    pub target: TransferStatus,
}

/// Atomically store the provider transfer id and mark the transfer requested.
#[derive(Debug, Clone)]
pub struct RecordTransferIssued {
    pub invoice_id: String,
    pub transfer_id: String,
    pub internal_transfer_id: String,
}

// ---------------------------------------------------------------------------
// SQL
// ---------------------------------------------------------------------------

impl InvoiceRecord {
    /// Lock a record for the rest of the transaction.
    async fn lock_by_id_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        invoice_id: &str,
    ) -> Result<Option<InvoiceRecord>, sqlx::Error> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM invoice_records WHERE invoice_id = $1 FOR UPDATE");
        sqlx::query_as::<_, InvoiceRecord>(&sql)
            .bind(invoice_id)
            .fetch_optional(&mut **tx)
            .await
    }

    async fn lock_by_transfer_id_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        transfer_id: &str,
    ) -> Result<Option<InvoiceRecord>, sqlx::Error> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM invoice_records \
             WHERE transfer_id = $1 AND transfer_id <> '' FOR UPDATE"
        );
        sqlx::query_as::<_, InvoiceRecord>(&sql)
            .bind(transfer_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Write every mutable column of `record` back to its row.
    async fn save_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        record: &InvoiceRecord,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE invoice_records
            SET invoice_status = $2,
                transfer_id = $3,
                internal_transfer_id = $4,
                transfer_status = $5,
                transfer_amount = $6,
                updated_at = $7
            WHERE invoice_id = $1
            "#,
        )
        .bind(&record.invoice_id)
        .bind(record.invoice_status)
        .bind(&record.transfer_id)
        .bind(&record.internal_transfer_id)
        .bind(record.transfer_status)
        .bind(record.transfer_amount)
        .bind(record.updated_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

impl Processor<InsertInvoiceRecord> for DatabaseProcessor {
    type Output = bool;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertInvoiceRecord")]
    async fn process(&self, insert: InsertInvoiceRecord) -> Result<bool, sqlx::Error> {
        let record = insert.record;
        let result = sqlx::query(
            r#"
            INSERT INTO invoice_records
                (invoice_id, invoice_status, transfer_id, internal_transfer_id,
                 transfer_status, transfer_amount, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (invoice_id) DO NOTHING
            "#,
        )
        .bind(&record.invoice_id)
        .bind(record.invoice_status)
        .bind(&record.transfer_id)
        .bind(&record.internal_transfer_id)
        .bind(record.transfer_status)
        .bind(record.transfer_amount)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl Processor<GetInvoiceRecordById> for DatabaseProcessor {
    type Output = Option<InvoiceRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetInvoiceRecordById")]
    async fn process(
        &self,
        query: GetInvoiceRecordById,
    ) -> Result<Option<InvoiceRecord>, sqlx::Error> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM invoice_records WHERE invoice_id = $1");
        sqlx::query_as::<_, InvoiceRecord>(&sql)
            .bind(query.invoice_id)
            .fetch_optional(&self.pool)
            .await
    }
}

impl Processor<GetInvoiceRecordByTransferId> for DatabaseProcessor {
    type Output = Option<InvoiceRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetInvoiceRecordByTransferId")]
    async fn process(
        &self,
        query: GetInvoiceRecordByTransferId,
    ) -> Result<Option<InvoiceRecord>, sqlx::Error> {
        if query.transfer_id.is_empty() {
            return Ok(None);
        }
        let sql = format!("SELECT {SELECT_COLUMNS} FROM invoice_records WHERE transfer_id = $1");
        sqlx::query_as::<_, InvoiceRecord>(&sql)
            .bind(query.transfer_id)
            .fetch_optional(&self.pool)
            .await
    }
}

impl Processor<ListInvoiceRecords> for DatabaseProcessor {
    type Output = Vec<InvoiceRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListInvoiceRecords")]
    async fn process(&self, query: ListInvoiceRecords) -> Result<Vec<InvoiceRecord>, sqlx::Error> {
        let mut query_builder = sqlx::QueryBuilder::new(format!(
            "SELECT {SELECT_COLUMNS} FROM invoice_records WHERE TRUE"
        ));

        if let Some(status) = query.invoice_status {
            query_builder.push(" AND invoice_status = ").push_bind(status);
        }
        if let Some(status) = query.transfer_status {
            query_builder.push(" AND transfer_status = ").push_bind(status);
        }
        if let Some(before) = query.updated_before {
            query_builder.push(" AND updated_at < ").push_bind(before);
        }

        query_builder
            .push(" ORDER BY created_at DESC, invoice_id ASC LIMIT ")
            .push_bind(query.limit)
            .push(" OFFSET ")
            .push_bind(query.offset);

        query_builder
            .build_query_as::<InvoiceRecord>()
            .fetch_all(&self.pool)
            .await
    }
}

impl Processor<AdvanceInvoiceStatus> for DatabaseProcessor {
    type Output = Option<InvoiceTransition>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:AdvanceInvoiceStatus")]
    async fn process(
        &self,
        cmd: AdvanceInvoiceStatus,
    ) -> Result<Option<InvoiceTransition>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let Some(mut record) = InvoiceRecord::lock_by_id_tx(&mut tx, &cmd.invoice_id).await? else {
            tx.rollback().await?;
            return Ok(None);
        };

        let transition =
            record.apply_invoice_status(cmd.target, cmd.claim.as_ref(), OffsetDateTime::now_utc());
        if transition.applied {
            InvoiceRecord::save_tx(&mut tx, &record).await?;
        }

        tx.commit().await?;
        Ok(Some(transition))
    }
}

impl Processor<AdvanceTransferStatus> for DatabaseProcessor {
    type Output = Option<TransferTransition>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:AdvanceTransferStatus")]
    async fn process(
        &self,
        cmd: AdvanceTransferStatus,
    ) -> Result<Option<TransferTransition>, sqlx::Error> {
        if cmd.transfer_id.is_empty() {
            return Ok(None);
        }

        let mut tx = self.pool.begin().await?;

        let Some(mut record) = InvoiceRecord::lock_by_transfer_id_tx(&mut tx, &cmd.transfer_id).await?
        else {
            tx.rollback().await?;
            return Ok(None);
        };

        let transition = record.apply_transfer_status(cmd.target, OffsetDateTime::now_utc());
        if transition.applied {
            InvoiceRecord::save_tx(&mut tx, &record).await?;
        }

        tx.commit().await?;
        Ok(Some(transition))
    }
}

impl Processor<RecordTransferIssued> for DatabaseProcessor {
    type Output = Option<InvoiceRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:RecordTransferIssued")]
    async fn process(&self, cmd: RecordTransferIssued) -> Result<Option<InvoiceRecord>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let Some(mut record) = InvoiceRecord::lock_by_id_tx(&mut tx, &cmd.invoice_id).await? else {
            tx.rollback().await?;
            return Ok(None);
        };

        if !record.apply_transfer_issued(
            &cmd.transfer_id,
            &cmd.internal_transfer_id,
            OffsetDateTime::now_utc(),
        ) {
            tx.rollback().await?;
            return Ok(None);
        }

        InvoiceRecord::save_tx(&mut tx, &record).await?;
        tx.commit().await?;
        Ok(Some(record))
    }
}
