//! Signed webhook envelope
//!
//! Wire format, bit-exact with the signing service:
//!
//! ```text
//! base64url(hex(HMAC-SHA256(secret, payload))) "." base64url(payload) ["." ignored]
//! ```

use base64::{
    alphabet,
    engine::{
        general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE},
        DecodePaddingMode,
    },
    Engine as _,
};
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{HrFlowError, HrFlowResult};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the envelope. Matched exactly.
pub const SIGNATURE_HEADER: &str = "HTTP-HRFLOW-SIGNATURE";

/// Standard alphabet, padding optional on decode
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decoded (but not yet verified) envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    /// Hex digest as sent by the signer
    signature: Vec<u8>,
    /// Raw JSON text
    payload: String,
}

impl SignedEnvelope {
    /// Split and base64url-decode an envelope
    pub fn parse(envelope: &str) -> HrFlowResult<Self> {
        let mut parts = envelope.trim().splitn(3, '.');
        let (encoded_signature, encoded_payload) = match (parts.next(), parts.next()) {
            (Some(signature), Some(payload)) => (signature, payload),
            _ => {
                return Err(HrFlowError::MalformedEnvelope(format!(
                    "Maybe it's not the '{}' field",
                    SIGNATURE_HEADER
                )))
            }
        };

        let signature = base64url_decode(encoded_signature).map_err(|e| {
            HrFlowError::MalformedEnvelope(format!("signature segment: {}", e))
        })?;
        let payload_bytes = base64url_decode(encoded_payload)
            .map_err(|e| HrFlowError::InvalidPayload(format!("payload segment: {}", e)))?;
        let payload = String::from_utf8(payload_bytes)
            .map_err(|_| HrFlowError::InvalidPayload("payload is not UTF-8".to_string()))?;

        Ok(Self { signature, payload })
    }

    /// Check the HMAC-SHA256 of the payload against the carried signature
    ///
    /// The comparison is constant-time and the error carries no detail.
    pub fn verify(&self, secret: &[u8]) -> HrFlowResult<()> {
        let expected = hex_digest(secret, self.payload.as_bytes())?;

        if bool::from(expected.as_bytes().ct_eq(&self.signature)) {
            Ok(())
        } else {
            Err(HrFlowError::InvalidSignature)
        }
    }

    /// Raw JSON text of the payload
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Parse the payload as JSON
    pub fn payload_json(&self) -> HrFlowResult<Value> {
        serde_json::from_str(&self.payload)
            .map_err(|e| HrFlowError::InvalidPayload(format!("payload is not JSON: {}", e)))
    }
}

/// Produce an envelope the way the signing service does
pub fn sign(secret: &[u8], payload: &str) -> HrFlowResult<String> {
    let digest = hex_digest(secret, payload.as_bytes())?;
    Ok(format!(
        "{}.{}",
        URL_SAFE.encode(digest),
        URL_SAFE.encode(payload)
    ))
}

fn hex_digest(secret: &[u8], payload: &[u8]) -> HrFlowResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| {
        tracing::error!("Failed to create HMAC instance");
        HrFlowError::InvalidSignature
    })?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// URL-safe alphabet translated to standard before decoding
fn base64url_decode(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let translated: String = input
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    LENIENT_STANDARD.decode(translated)
}
