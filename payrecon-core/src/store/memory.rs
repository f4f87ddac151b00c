use super::{RecordStore, StoreError};
use crate::entities::invoice_records::{
    InvoiceRecord, InvoiceTransition, ListInvoiceRecords, TransferClaim, TransferTransition,
};
use crate::entities::{InvoiceStatus, TransferStatus};
use std::collections::HashMap;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock};

type RecordSlot = Arc<Mutex<InvoiceRecord>>;

/// Process-local [`RecordStore`] for tests and `--in-memory` runs.
///
/// Each record sits behind its own mutex. Lock order is record first, then
/// `transfer_index`; the index lock is never held while waiting on a record.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<String, RecordSlot>>,
    /// transfer_id -> invoice_id
    transfer_index: RwLock<HashMap<String, String>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, invoice_id: &str) -> Option<RecordSlot> {
        self.records.read().await.get(invoice_id).cloned()
    }

    async fn slot_by_transfer_id(&self, transfer_id: &str) -> Option<RecordSlot> {
        if transfer_id.is_empty() {
            return None;
        }
        let invoice_id = self.transfer_index.read().await.get(transfer_id).cloned()?;
        self.slot(&invoice_id).await
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, record: InvoiceRecord) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.invoice_id) {
            return Ok(false);
        }
        if !record.transfer_id.is_empty() {
            self.transfer_index
                .write()
                .await
                .insert(record.transfer_id.clone(), record.invoice_id.clone());
        }
        records.insert(record.invoice_id.clone(), Arc::new(Mutex::new(record)));
        Ok(true)
    }

    async fn get_by_invoice_id(
        &self,
        invoice_id: &str,
    ) -> Result<Option<InvoiceRecord>, StoreError> {
        match self.slot(invoice_id).await {
            Some(slot) => Ok(Some(slot.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn get_by_transfer_id(
        &self,
        transfer_id: &str,
    ) -> Result<Option<InvoiceRecord>, StoreError> {
        let Some(slot) = self.slot_by_transfer_id(transfer_id).await else {
            return Ok(None);
        };
        let record = slot.lock().await;
        Ok((record.transfer_id == transfer_id).then(|| record.clone()))
    }

    async fn list(&self, query: ListInvoiceRecords) -> Result<Vec<InvoiceRecord>, StoreError> {
        let slots: Vec<RecordSlot> = self.records.read().await.values().cloned().collect();

        let mut matching = Vec::with_capacity(slots.len());
        for slot in slots {
            let record = slot.lock().await;
            let invoice_ok = query
                .invoice_status
                .is_none_or(|status| record.invoice_status == status);
            let transfer_ok = query
                .transfer_status
                .is_none_or(|status| record.transfer_status == status);
            let updated_ok = query
                .updated_before
                .is_none_or(|before| record.updated_at < before);
            if invoice_ok && transfer_ok && updated_ok {
                matching.push(record.clone());
            }
        }

        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.invoice_id.cmp(&b.invoice_id))
        });

        let offset = usize::try_from(query.offset).unwrap_or(0);
        let limit = usize::try_from(query.limit).unwrap_or(0);
        Ok(matching.into_iter().skip(offset).take(limit).collect())
    }

    async fn advance_invoice_status(
        &self,
        invoice_id: &str,
        target: InvoiceStatus,
        claim: Option<TransferClaim>,
    ) -> Result<Option<InvoiceTransition>, StoreError> {
        let Some(slot) = self.slot(invoice_id).await else {
            return Ok(None);
        };
        let mut record = slot.lock().await;
        Ok(Some(record.apply_invoice_status(
            target,
            claim.as_ref(),
            OffsetDateTime::now_utc(),
        )))
    }

    async fn advance_transfer_status(
        &self,
        transfer_id: &str,
        target: TransferStatus,
    ) -> Result<Option<TransferTransition>, StoreError> {
        let Some(slot) = self.slot_by_transfer_id(transfer_id).await else {
            return Ok(None);
        };
        let mut record = slot.lock().await;
        if record.transfer_id != transfer_id {
            return Ok(None);
        }
        Ok(Some(
            record.apply_transfer_status(target, OffsetDateTime::now_utc()),
        ))
    }

    async fn record_transfer_issued(
        &self,
        invoice_id: &str,
        transfer_id: &str,
        internal_transfer_id: &str,
    ) -> Result<Option<InvoiceRecord>, StoreError> {
        let Some(slot) = self.slot(invoice_id).await else {
            return Ok(None);
        };
        let mut record = slot.lock().await;
        let mut index = self.transfer_index.write().await;
        if index.get(transfer_id).is_some_and(|owner| owner != invoice_id) {
            return Err(StoreError::DuplicateKey(format!("transfer_id {transfer_id}")));
        }
        if !record.apply_transfer_issued(transfer_id, internal_transfer_id, OffsetDateTime::now_utc())
        {
            return Ok(None);
        }
        index.insert(transfer_id.to_owned(), invoice_id.to_owned());
        Ok(Some(record.clone()))
    }
}
