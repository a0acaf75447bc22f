//! A source verifier backed by the Etherscan contract verification API

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    constants::{STANDARD_JSON_CODE_FORMAT, VERIFICATION_MAX_POLLS, VERIFICATION_POLL_INTERVAL_MS},
    errors::ScriptError,
    types::VerificationRequest,
};

use super::SourceVerifier;

/// Submits contracts to Etherscan for verification & polls for the verdict
pub struct EtherscanVerifier {
    /// The HTTP client
    client: reqwest::Client,
    /// The Etherscan API endpoint, `None` on networks without an explorer
    api_url: Option<String>,
    /// The Etherscan API key
    api_key: String,
    /// The name of the network, for error messages
    network: String,
}

impl EtherscanVerifier {
    /// Create a verifier for the given explorer endpoint
    pub fn new(api_url: Option<String>, api_key: String, network: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
            network,
        }
    }

    /// Send a request to the API & parse its response envelope
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<ApiResponse, ScriptError> {
        request
            .send()
            .await
            .map_err(|e| ScriptError::Verification(e.to_string()))?
            .error_for_status()
            .map_err(|e| ScriptError::Verification(e.to_string()))?
            .json()
            .await
            .map_err(|e| ScriptError::Verification(format!("malformed explorer response: {}", e)))
    }
}

#[async_trait]
impl SourceVerifier for EtherscanVerifier {
    async fn verify(&self, request: &VerificationRequest) -> Result<(), ScriptError> {
        let api_url = self.api_url.as_deref().ok_or_else(|| {
            ScriptError::Verification(format!(
                "no block explorer configured for network {}",
                self.network
            ))
        })?;

        let form = verification_form(request, &self.api_key)?;
        let response = self.send(self.client.post(api_url).form(&form)).await?;

        let guid = match submission_outcome(response)? {
            Submission::Pending(guid) => guid,
            Submission::AlreadyVerified => {
                info!("{:#x} is already verified", request.address);
                return Ok(());
            }
        };
        debug!("Verification of {:#x} submitted, guid {}", request.address, guid);

        // Poll the status of the single submission
        for _ in 0..VERIFICATION_MAX_POLLS {
            tokio::time::sleep(Duration::from_millis(VERIFICATION_POLL_INTERVAL_MS)).await;

            let query = [
                ("apikey", self.api_key.as_str()),
                ("module", "contract"),
                ("action", "checkverifystatus"),
                ("guid", guid.as_str()),
            ];
            let response = self.send(self.client.get(api_url).query(&query)).await?;

            match verification_status(&response) {
                VerificationStatus::Pending => continue,
                VerificationStatus::Verified => {
                    info!("Verified {} at {:#x}", request.contract_name, request.address);
                    return Ok(());
                }
                VerificationStatus::Failed(reason) => {
                    return Err(ScriptError::Verification(format!(
                        "{} at {:#x}: {}",
                        request.contract_name, request.address, reason
                    )))
                }
            }
        }

        Err(ScriptError::Verification(format!(
            "no verdict for {:#x} after {} polls",
            request.address, VERIFICATION_MAX_POLLS
        )))
    }
}

// ------------
// | Protocol |
// ------------

/// The envelope every Etherscan API response is wrapped in
#[derive(Deserialize, Debug)]
pub struct ApiResponse {
    /// "1" on success, "0" otherwise
    pub status: String,
    /// A short status message
    pub message: String,
    /// The payload; a GUID or a human readable status for the verification API
    pub result: String,
}

/// The outcome of submitting a verification request
#[derive(Debug, PartialEq, Eq)]
pub enum Submission {
    /// The request was queued under the given GUID
    Pending(String),
    /// The contract's source was already verified
    AlreadyVerified,
}

/// The status of a queued verification request
#[derive(Debug, PartialEq, Eq)]
pub enum VerificationStatus {
    /// Still in the explorer's queue
    Pending,
    /// The source matched the deployed bytecode
    Verified,
    /// The explorer rejected the source
    Failed(String),
}

/// Build the form for a `verifysourcecode` submission
pub fn verification_form(
    request: &VerificationRequest,
    api_key: &str,
) -> Result<Vec<(&'static str, String)>, ScriptError> {
    let source_code = serde_json::to_string(&request.source.standard_json_input)
        .map_err(|e| ScriptError::Verification(e.to_string()))?;

    Ok(vec![
        ("apikey", api_key.to_string()),
        ("module", "contract".to_string()),
        ("action", "verifysourcecode".to_string()),
        ("contractaddress", format!("{:#x}", request.address)),
        ("sourceCode", source_code),
        ("codeformat", STANDARD_JSON_CODE_FORMAT.to_string()),
        ("contractname", request.contract_name.clone()),
        (
            "compilerversion",
            format!("v{}", request.source.compiler_version),
        ),
        // Sic, the API misspells this field
        (
            "constructorArguements",
            hex::encode(&request.constructor_args),
        ),
    ])
}

/// Interpret the response to a `verifysourcecode` submission
pub fn submission_outcome(response: ApiResponse) -> Result<Submission, ScriptError> {
    if response.status == "1" {
        return Ok(Submission::Pending(response.result));
    }

    if is_already_verified(&response.result) {
        Ok(Submission::AlreadyVerified)
    } else {
        Err(ScriptError::Verification(format!(
            "submission rejected: {} ({})",
            response.result, response.message
        )))
    }
}

/// Interpret the response to a `checkverifystatus` query
pub fn verification_status(response: &ApiResponse) -> VerificationStatus {
    if response.result.to_lowercase().contains("pending") {
        VerificationStatus::Pending
    } else if response.status == "1" || is_already_verified(&response.result) {
        VerificationStatus::Verified
    } else {
        VerificationStatus::Failed(response.result.clone())
    }
}

/// Whether a result message reports the contract as already verified
fn is_already_verified(result: &str) -> bool {
    result.to_lowercase().contains("already verified")
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::{
        submission_outcome, verification_form, verification_status, ApiResponse,
        EtherscanVerifier, Submission, VerificationStatus,
    };
    use crate::{
        clients::SourceVerifier,
        errors::ScriptError,
        test_helpers::compiled_contract,
        types::{Contract, VerificationRequest},
    };

    fn response(status: &str, result: &str) -> ApiResponse {
        ApiResponse {
            status: status.to_string(),
            message: if status == "1" { "OK" } else { "NOTOK" }.to_string(),
            result: result.to_string(),
        }
    }

    fn request() -> VerificationRequest {
        VerificationRequest::new(
            address!("00000000000000000000000000000000000000aa"),
            &compiled_contract(Contract::StakingPool),
        )
    }

    #[test]
    fn test_form_has_empty_constructor_args() {
        let form = verification_form(&request(), "key").unwrap();
        let field = |name: &str| {
            form.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.clone())
                .unwrap()
        };

        assert_eq!(field("constructorArguements"), "");
        assert_eq!(
            field("contractname"),
            "contracts/DappStakingPool.sol:DappStakingPool"
        );
        assert_eq!(field("compilerversion"), "v0.6.12+commit.27d51765");
        assert_eq!(
            field("contractaddress"),
            "0x00000000000000000000000000000000000000aa"
        );
        assert_eq!(field("codeformat"), "solidity-standard-json-input");
    }

    #[test]
    fn test_submission_outcome() {
        assert_eq!(
            submission_outcome(response("1", "guid")).unwrap(),
            Submission::Pending("guid".to_string())
        );
        assert_eq!(
            submission_outcome(response("0", "Contract source code already verified")).unwrap(),
            Submission::AlreadyVerified
        );
        assert!(matches!(
            submission_outcome(response("0", "Invalid API Key")),
            Err(ScriptError::Verification(_))
        ));
    }

    #[test]
    fn test_verification_status() {
        assert_eq!(
            verification_status(&response("0", "Pending in queue")),
            VerificationStatus::Pending
        );
        assert_eq!(
            verification_status(&response("1", "Pass - Verified")),
            VerificationStatus::Verified
        );
        assert_eq!(
            verification_status(&response("0", "Already Verified")),
            VerificationStatus::Verified
        );
        assert_eq!(
            verification_status(&response("0", "Fail - Unable to verify")),
            VerificationStatus::Failed("Fail - Unable to verify".to_string())
        );
    }

    #[tokio::test]
    async fn test_network_without_explorer() {
        let verifier =
            EtherscanVerifier::new(None, "key".to_string(), "local-fork".to_string());

        let res = verifier.verify(&request()).await;
        assert!(matches!(res, Err(ScriptError::Verification(_))));
    }
}
