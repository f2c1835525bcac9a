//! Data exchanged with the verification server
//!
//! Request bodies, the start-session response, the prompt shown to the user
//! and the decrypted person record.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::{EncodedPublicKey, PUBLIC_KEY_ALGORITHM};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct PublicKeyBody<'a> {
    pub encoded: &'a str,
    pub algorithm: &'static str,
}

impl<'a> From<&'a EncodedPublicKey> for PublicKeyBody<'a> {
    fn from(key: &'a EncodedPublicKey) -> Self {
        Self {
            encoded: key.as_str(),
            algorithm: PUBLIC_KEY_ALGORITHM,
        }
    }
}

/// Body of the session-creation request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest<'a> {
    pub session_uuid: String,
    pub public_key: PublicKeyBody<'a>,
}

/// Body of the data-pull request
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullDataRequest<'a> {
    pub secret: &'a str,
    pub public_key: PublicKeyBody<'a>,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Successful session-creation response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionResponse {
    pub code: u64,
    pub qr_code: String,
    pub secret: SecretString,
}

impl StartSessionResponse {
    pub fn prompt(&self) -> AppPrompt {
        AppPrompt {
            code: self.code,
            qr_code: self.qr_code.clone(),
        }
    }
}

/// What the person being verified enters (or scans) in the mobile app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppPrompt {
    /// Numeric code typed into the app
    pub code: u64,
    /// Payload to render as a QR code
    pub qr_code: String,
}

// ---------------------------------------------------------------------------
// Person
// ---------------------------------------------------------------------------

/// Decrypted identity document data
///
/// Field values are zeroized on drop.
#[derive(Clone, PartialEq, Eq, Serialize, Zeroize, ZeroizeOnDrop)]
pub struct PersonRecord {
    /// When the server confirmed the verification
    pub verification_timestamp: String,
    /// Base64-encoded photo
    pub picture: String,
    pub surname: String,
    pub given_names: String,
    /// PESEL number
    pub national_id: String,
    pub birth_date: String,
    pub citizenship: String,
    pub father_name: String,
    pub mother_name: String,
    /// Mobile ID card series and number
    pub document_number: String,
    pub document_issue_date: String,
    pub document_expiry_date: String,
}

impl PersonRecord {
    pub(crate) fn from_payload(verification_timestamp: String, payload: PersonPayload) -> Self {
        Self {
            verification_timestamp,
            picture: payload.picture.clone(),
            surname: payload.surname.clone(),
            given_names: payload.names.clone(),
            national_id: payload.pesel.clone(),
            birth_date: payload.birth_date.clone(),
            citizenship: payload.citizenship.clone(),
            father_name: payload.father_name.clone(),
            mother_name: payload.mother_name.clone(),
            document_number: payload.mobile_id_card_number.clone(),
            document_issue_date: payload.mobile_id_card_valid_from.clone(),
            document_expiry_date: payload.mobile_id_card_valid_to.clone(),
        }
    }

    /// Verification timestamp parsed as RFC 3339, if the server sent one
    pub fn verified_at(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.verification_timestamp).ok()
    }
}

impl fmt::Debug for PersonRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersonRecord")
            .field("verification_timestamp", &self.verification_timestamp)
            .field("picture", &format_args!("<{} bytes>", self.picture.len()))
            .finish_non_exhaustive()
    }
}

/// Decrypted JSON as sent by the server
///
/// Every field is required; unknown fields are ignored.
#[derive(Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PersonPayload {
    picture: String,
    surname: String,
    names: String,
    pesel: String,
    birth_date: String,
    citizenship: String,
    father_name: String,
    mother_name: String,
    mobile_id_card_number: String,
    mobile_id_card_valid_from: String,
    mobile_id_card_valid_to: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_person_json;
    use secrecy::ExposeSecret;

    #[test]
    fn test_start_response_parses() {
        let response: StartSessionResponse =
            serde_json::from_str(r#"{"code":123456,"qrCode":"Q1","secret":"abc"}"#).unwrap();

        assert_eq!(response.secret.expose_secret(), "abc");
        assert_eq!(
            response.prompt(),
            AppPrompt {
                code: 123456,
                qr_code: "Q1".into()
            }
        );
    }

    #[test]
    fn test_start_response_requires_secret() {
        let result = serde_json::from_str::<StartSessionResponse>(r#"{"code":1,"qrCode":"Q"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_request_wire_format() {
        let key = crate::test_support::shared_keypair().export_public_key().unwrap();
        let body = StartSessionRequest {
            session_uuid: "00000000-0000-0000-0000-000000000001".into(),
            public_key: PublicKeyBody::from(&key),
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["sessionUuid"], "00000000-0000-0000-0000-000000000001");
        assert_eq!(json["publicKey"]["algorithm"], "RSA");
        assert_eq!(json["publicKey"]["encoded"], key.as_str());
    }

    #[test]
    fn test_person_mapping() {
        let payload: PersonPayload = serde_json::from_str(&sample_person_json()).unwrap();
        let person = PersonRecord::from_payload("2025-01-01T00:00:00Z".into(), payload);

        assert_eq!(person.given_names, "JAN MARIA");
        assert_eq!(person.national_id, "90010112345");
        assert_eq!(person.document_number, "ZZC123456");
        assert!(person.verified_at().is_some());
    }

    #[test]
    fn test_person_missing_field_rejected() {
        let result = serde_json::from_str::<PersonPayload>(r#"{"surname":"KOWALSKI"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_redacts_personal_data() {
        let payload: PersonPayload = serde_json::from_str(&sample_person_json()).unwrap();
        let person = PersonRecord::from_payload(String::new(), payload);

        let debug = format!("{:?}", person);
        assert!(!debug.contains(&person.picture));
        assert!(!debug.contains(&person.national_id));
        assert!(!debug.contains(&person.surname));
        assert!(!debug.contains(&person.given_names));
        assert!(!debug.contains(&person.document_number));
    }
}
