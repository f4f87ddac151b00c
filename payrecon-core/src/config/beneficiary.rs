//! Fixed destination account for outbound transfers.

use payrecon_sdk::objects::TransferRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeneficiaryConfig {
    pub bank_code: String,
    pub branch_code: String,
    pub account_number: String,
    pub name: String,
    pub tax_id: String,
    pub account_type: String,
}

impl BeneficiaryConfig {
    /// Build a transfer of `amount` to this account, tagged with the
    /// idempotency token.
    pub fn transfer_request(&self, amount: i64, external_id: &str) -> TransferRequest {
        TransferRequest {
            amount,
            bank_code: self.bank_code.clone(),
            branch_code: self.branch_code.clone(),
            account_number: self.account_number.clone(),
            name: self.name.clone(),
            tax_id: self.tax_id.clone(),
            account_type: self.account_type.clone(),
            external_id: external_id.to_owned(),
        }
    }
}

impl Default for BeneficiaryConfig {
    fn default() -> Self {
        Self {
            bank_code: "20018183".to_string(),
            branch_code: "0001".to_string(),
            account_number: "6341320293482496".to_string(),
            name: "Stark Bank S.A.".to_string(),
            tax_id: "20.018.183/0001-80".to_string(),
            account_type: "payment".to_string(),
        }
    }
}
