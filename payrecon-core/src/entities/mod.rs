pub mod invoice_records;

use payrecon_sdk::objects::{
    InvoiceStatus as SdkInvoiceStatus, TransferStatus as SdkTransferStatus,
};

/// Invoice lifecycle status for database operations.
///
/// Variants are declared in lifecycle order; the derived `Ord` is the
/// advancement order. For API/DTO use, see `payrecon_sdk::objects::InvoiceStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "invoice_status")]
pub enum InvoiceStatus {
    Unrequested,
    Requested,
    Created,
    Paid,
}

impl InvoiceStatus {
    /// Forward-only: any strictly later status is reachable, nothing else.
    pub fn can_advance_to(self, target: InvoiceStatus) -> bool {
        target > self
    }
}

/// Outbound transfer status for database operations.
///
/// `Completed` and `Failed` are terminal. For API/DTO use, see
/// `payrecon_sdk::objects::TransferStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "transfer_status")]
pub enum TransferStatus {
    Unrequested,
    Requested,
    Created,
    Completed,
    Failed,
}

impl TransferStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TransferStatus::Completed | TransferStatus::Failed)
    }

    /// Position on the success path. `Failed` sits off the path.
    fn rank(self) -> Option<u8> {
        match self {
            TransferStatus::Unrequested => Some(0),
            TransferStatus::Requested => Some(1),
            TransferStatus::Created => Some(2),
            TransferStatus::Completed => Some(3),
            TransferStatus::Failed => None,
        }
    }

    /// Advances along the success path, or to `Failed` from any
    /// non-terminal status.
    pub fn can_advance_to(self, target: TransferStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), target.rank()) {
            (_, None) => true,
            (Some(current), Some(next)) => next > current,
            (None, Some(_)) => false,
        }
    }
}

impl From<InvoiceStatus> for SdkInvoiceStatus {
    fn from(value: InvoiceStatus) -> Self {
        match value {
            InvoiceStatus::Unrequested => SdkInvoiceStatus::Unrequested,
            InvoiceStatus::Requested => SdkInvoiceStatus::Requested,
            InvoiceStatus::Created => SdkInvoiceStatus::Created,
            InvoiceStatus::Paid => SdkInvoiceStatus::Paid,
        }
    }
}

impl From<SdkInvoiceStatus> for InvoiceStatus {
    fn from(value: SdkInvoiceStatus) -> Self {
        match value {
            SdkInvoiceStatus::Unrequested => InvoiceStatus::Unrequested,
            SdkInvoiceStatus::Requested => InvoiceStatus::Requested,
            SdkInvoiceStatus::Created => InvoiceStatus::Created,
            SdkInvoiceStatus::Paid => InvoiceStatus::Paid,
        }
    }
}

impl From<TransferStatus> for SdkTransferStatus {
    fn from(value: TransferStatus) -> Self {
        match value {
            TransferStatus::Unrequested => SdkTransferStatus::Unrequested,
            TransferStatus::Requested => SdkTransferStatus::Requested,
            TransferStatus::Created => SdkTransferStatus::Created,
            TransferStatus::Completed => SdkTransferStatus::Completed,
            TransferStatus::Failed => SdkTransferStatus::Failed,
        }
    }
}

impl From<SdkTransferStatus> for TransferStatus {
    fn from(value: SdkTransferStatus) -> Self {
        match value {
            SdkTransferStatus::Unrequested => TransferStatus::Unrequested,
            SdkTransferStatus::Requested => TransferStatus::Requested,
            SdkTransferStatus::Created => TransferStatus::Created,
            SdkTransferStatus::Completed => TransferStatus::Completed,
            SdkTransferStatus::Failed => TransferStatus::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_status_only_moves_forward() {
        use InvoiceStatus::*;
        assert!(Unrequested.can_advance_to(Requested));
        assert!(Unrequested.can_advance_to(Created));
        assert!(Created.can_advance_to(Paid));
        assert!(!Paid.can_advance_to(Created));
        assert!(!Created.can_advance_to(Created));
        assert!(!Paid.can_advance_to(Paid));
    }

    #[test]
    fn test_transfer_status_success_path() {
        use TransferStatus::*;
        assert!(Unrequested.can_advance_to(Requested));
        assert!(Requested.can_advance_to(Created));
        assert!(Created.can_advance_to(Completed));
        assert!(Unrequested.can_advance_to(Created));
        assert!(!Created.can_advance_to(Requested));
        assert!(!Created.can_advance_to(Created));
    }

    #[test]
    fn test_transfer_status_terminal_states() {
        use TransferStatus::*;
        assert!(Requested.can_advance_to(Failed));
        assert!(Created.can_advance_to(Failed));
        for target in [Unrequested, Requested, Created, Completed, Failed] {
            assert!(!Completed.can_advance_to(target));
            assert!(!Failed.can_advance_to(target));
        }
    }
}
