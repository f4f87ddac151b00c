use super::{RecordStore, StoreError};
use crate::entities::invoice_records::{
    AdvanceInvoiceStatus, AdvanceTransferStatus, GetInvoiceRecordById,
    GetInvoiceRecordByTransferId, InsertInvoiceRecord, InvoiceRecord, InvoiceTransition,
    ListInvoiceRecords, RecordTransferIssued, TransferClaim, TransferTransition,
};
use crate::entities::{InvoiceStatus, TransferStatus};
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;

/// [`RecordStore`] backed by the `invoice_records` table.
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    processor: DatabaseProcessor,
}

impl PgRecordStore {
    pub fn new(processor: DatabaseProcessor) -> Self {
        Self { processor }
    }
}

#[async_trait::async_trait]
impl RecordStore for PgRecordStore {
    async fn insert(&self, record: InvoiceRecord) -> Result<bool, StoreError> {
        Ok(self.processor.process(InsertInvoiceRecord { record }).await?)
    }

    async fn get_by_invoice_id(
        &self,
        invoice_id: &str,
    ) -> Result<Option<InvoiceRecord>, StoreError> {
        Ok(self
            .processor
            .process(GetInvoiceRecordById {
                invoice_id: invoice_id.to_owned(),
            })
            .await?)
    }

    async fn get_by_transfer_id(
        &self,
        transfer_id: &str,
    ) -> Result<Option<InvoiceRecord>, StoreError> {
        Ok(self
            .processor
            .process(GetInvoiceRecordByTransferId {
                transfer_id: transfer_id.to_owned(),
            })
            .await?)
    }

    async fn list(&self, query: ListInvoiceRecords) -> Result<Vec<InvoiceRecord>, StoreError> {
        Ok(self.processor.process(query).await?)
    }

    async fn advance_invoice_status(
        &self,
        invoice_id: &str,
        target: InvoiceStatus,
        claim: Option<TransferClaim>,
    ) -> Result<Option<InvoiceTransition>, StoreError> {
        Ok(self
            .processor
            .process(AdvanceInvoiceStatus {
                invoice_id: invoice_id.to_owned(),
                target,
                claim,
            })
            .await?)
    }

    async fn advance_transfer_status(
        &self,
        transfer_id: &str,
        target: TransferStatus,
    ) -> Result<Option<TransferTransition>, StoreError> {
        Ok(self
            .processor
            .process(AdvanceTransferStatus {
                transfer_id: transfer_id.to_owned(),
                target,
            })
            .await?)
    }

    async fn record_transfer_issued(
        &self,
        invoice_id: &str,
        transfer_id: &str,
        internal_transfer_id: &str,
    ) -> Result<Option<InvoiceRecord>, StoreError> {
        Ok(self
            .processor
            .process(RecordTransferIssued {
                invoice_id: invoice_id.to_owned(),
                transfer_id: transfer_id.to_owned(),
                internal_transfer_id: internal_transfer_id.to_owned(),
            })
            .await?)
    }
}
