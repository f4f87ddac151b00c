//! Outbound transfer requests.

use crate::config::{BeneficiaryConfig, ConfigStore};
use crate::provider::{PaymentProvider, ProviderError, with_timeout};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// A transfer accepted by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedTransfer {
    /// Provider-assigned id; the lookup key for later transfer events.
    pub transfer_id: String,
    /// The idempotency token sent as the transfer's external id.
    pub internal_transfer_id: String,
}

/// Sends one transfer per call to the configured beneficiary.
///
/// There are no retries. A call that exceeds `timeout` fails with
/// [`ProviderError::Timeout`].
#[derive(Clone)]
pub struct TransferIssuer {
    provider: Arc<dyn PaymentProvider>,
    beneficiary: ConfigStore<BeneficiaryConfig>,
    timeout: Duration,
}

impl TransferIssuer {
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        beneficiary: ConfigStore<BeneficiaryConfig>,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            beneficiary,
            timeout,
        }
    }

    pub async fn issue(
        &self,
        amount: i64,
        internal_transfer_id: &str,
    ) -> Result<IssuedTransfer, ProviderError> {
        if amount <= 0 {
            return Err(ProviderError::InvalidAmount(amount));
        }

        let request = self
            .beneficiary
            .read()
            .await
            .transfer_request(amount, internal_transfer_id);

        let created = with_timeout(self.timeout, self.provider.create_transfer(request)).await?;
        if created.id.is_empty() {
            return Err(ProviderError::EmptyResponse("transfer id"));
        }

        info!(
            transfer_id = %created.id,
            internal_transfer_id,
            amount,
            "Transfer requested"
        );

        Ok(IssuedTransfer {
            transfer_id: created.id,
            internal_transfer_id: internal_transfer_id.to_owned(),
        })
    }
}
