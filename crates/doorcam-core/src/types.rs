use crate::{
    Result,
    constants::{MAX_UID_LENGTH, SUCCESS_MARKER},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical credential identifier.
///
/// Fixed-width uppercase hexadecimal of the raw UID bytes, two characters per
/// byte, no separators, byte order preserved. The canonical form is a pure
/// function of the raw bytes: the same token always normalizes identically.
///
/// # Examples
///
/// ```
/// use doorcam_core::CredentialId;
///
/// let id = CredentialId::from_uid_bytes(&[0x0A, 0xFF]).unwrap();
/// assert_eq!(id.as_str(), "0AFF");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialId(String);

impl CredentialId {
    /// Normalize raw UID bytes into their canonical form.
    ///
    /// # Errors
    /// Returns `Error::InvalidCredential` if the UID is empty or longer than
    /// [`MAX_UID_LENGTH`] bytes.
    pub fn from_uid_bytes(uid: &[u8]) -> Result<Self> {
        if uid.is_empty() {
            return Err(Error::InvalidCredential("UID is empty".to_string()));
        }
        if uid.len() > MAX_UID_LENGTH {
            return Err(Error::InvalidCredential(format!(
                "UID must be at most {MAX_UID_LENGTH} bytes, got {}",
                uid.len()
            )));
        }

        Ok(CredentialId(
            uid.iter().map(|b| format!("{b:02X}")).collect(),
        ))
    }

    /// Get the canonical identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of raw bytes this identifier was built from.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.0.len() / 2
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CredentialId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Outcome of one authorization round trip.
///
/// A verdict is `approved` only when the remote service answered with a
/// success status and a body containing [`SUCCESS_MARKER`]. Every other
/// outcome, transport failures included, is a denial. The raw body is kept
/// for diagnostics only and never influences anything but logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    approved: bool,
    status: Option<u16>,
    payload: String,
}

impl Verdict {
    /// Interpret a remote response.
    ///
    /// # Examples
    ///
    /// ```
    /// use doorcam_core::Verdict;
    ///
    /// assert!(Verdict::from_response(200, r#"{"status":"ok"}"#).is_approved());
    /// assert!(!Verdict::from_response(200, r#"{"status":"denied"}"#).is_approved());
    /// assert!(!Verdict::from_response(500, r#"{"status":"ok"}"#).is_approved());
    /// ```
    pub fn from_response(status: u16, body: impl Into<String>) -> Self {
        let payload = body.into();
        let success_status = (200..300).contains(&status);

        Self {
            approved: success_status && payload.contains(SUCCESS_MARKER),
            status: Some(status),
            payload,
        }
    }

    /// Denial for a round trip that never produced a response.
    pub fn transport_failure(reason: impl Into<String>) -> Self {
        Self {
            approved: false,
            status: None,
            payload: reason.into(),
        }
    }

    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.approved
    }

    /// HTTP status of the response, `None` if the transport failed.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Raw response body, or the transport error text.
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.approved, self.status) {
            (true, _) => write!(f, "approved"),
            (false, Some(status)) => write!(f, "denied (status {status})"),
            (false, None) => write!(f, "denied (transport failure)"),
        }
    }
}
