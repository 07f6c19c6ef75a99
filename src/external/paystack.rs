use crate::config::PaystackConfig;
use crate::error::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub status: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<TransactionData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionData {
    pub status: String,
    pub reference: String,
    /// Minor units (pesewas for GHS).
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub paid_at: Option<String>,
}

impl VerifyResponse {
    /// Verified means the API call succeeded and the charge itself succeeded.
    pub fn successful_transaction(self) -> Option<TransactionData> {
        if !self.status {
            return None;
        }
        self.data.filter(|d| d.status == "success")
    }
}

/// Gateway references are ASCII alphanumerics plus `-`, `_`, `.` and `=`, with at
/// least one alphanumeric so the reference is never a bare `.` or `..` path segment.
pub fn is_valid_reference(reference: &str) -> bool {
    reference.chars().any(|c| c.is_ascii_alphanumeric())
        && reference
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '='))
}

#[derive(Clone)]
pub struct PaystackService {
    client: Client,
    config: PaystackConfig,
}

impl PaystackService {
    pub fn new(config: PaystackConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn public_key(&self) -> &str {
        &self.config.public_key
    }

    pub fn currency(&self) -> &str {
        &self.config.currency
    }

    pub fn is_configured(&self) -> bool {
        !self.config.secret_key.is_empty()
    }

    /// Asks the gateway whether `reference` is a successful charge.
    ///
    /// Returns `Ok(None)` when the gateway answered but the charge did not succeed.
    pub async fn verify_transaction(&self, reference: &str) -> AppResult<Option<TransactionData>> {
        if !is_valid_reference(reference) {
            return Err(AppError::ValidationError(
                "Invalid payment reference".to_string(),
            ));
        }

        let url = format!(
            "{}/transaction/verify/{}",
            self.config.base_url.trim_end_matches('/'),
            reference
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.secret_key)
            .send()
            .await?;

        // Paystack answers 4xx with a JSON body for unknown references.
        let status = response.status();
        let body = response.text().await?;
        let parsed: VerifyResponse = serde_json::from_str(&body).map_err(|_| {
            AppError::ExternalApiError(format!(
                "Unexpected Paystack response (HTTP {}): {}",
                status.as_u16(),
                body
            ))
        })?;

        if !parsed.status {
            log::warn!(
                "Paystack rejected reference {reference}: {}",
                parsed.message.as_deref().unwrap_or("no message")
            );
        }

        Ok(parsed.successful_transaction())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> VerifyResponse {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn test_successful_transaction_requires_both_flags() {
        let ok = parse(
            r#"{"status":true,"message":"Verification successful","data":{"status":"success","reference":"T1","amount":2000,"currency":"GHS"}}"#,
        );
        let data = ok.successful_transaction().unwrap();
        assert_eq!(data.reference, "T1");
        assert_eq!(data.amount, 2000);

        let abandoned = parse(
            r#"{"status":true,"data":{"status":"abandoned","reference":"T2","amount":2000}}"#,
        );
        assert!(abandoned.successful_transaction().is_none());

        let unknown = parse(r#"{"status":false,"message":"Transaction reference not found"}"#);
        assert!(unknown.successful_transaction().is_none());
    }

    #[test]
    fn test_reference_charset() {
        assert!(is_valid_reference("T1"));
        assert!(is_valid_reference("1716549283741"));
        assert!(is_valid_reference("order-12_a.b=c"));
        assert!(!is_valid_reference(""));
        assert!(!is_valid_reference(".."));
        assert!(!is_valid_reference("../../customer"));
        assert!(!is_valid_reference("T1/x"));
        assert!(!is_valid_reference("T1?perPage=100"));
        assert!(!is_valid_reference("T 1"));
    }

    #[tokio::test]
    async fn test_unsafe_reference_is_rejected_before_request() {
        let service = PaystackService::new(PaystackConfig {
            secret_key: "sk_test".to_string(),
            public_key: "pk_test".to_string(),
            // nothing listens here; a request would surface as ReqwestError
            base_url: "http://127.0.0.1:9".to_string(),
            currency: "GHS".to_string(),
        });
        assert!(matches!(
            service.verify_transaction("../../customer").await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn test_paystack_service_creation() {
        let service = PaystackService::new(PaystackConfig {
            secret_key: "sk_test_123".to_string(),
            public_key: "pk_test_123".to_string(),
            base_url: "https://api.paystack.co".to_string(),
            currency: "GHS".to_string(),
        });
        assert!(service.is_configured());
        assert_eq!(service.public_key(), "pk_test_123");
        assert_eq!(service.currency(), "GHS");
    }
}
