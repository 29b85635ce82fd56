//! Persisted confirmation records and their field types.

use std::fmt;

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{ConfirmError, ConfirmResult};
use crate::random::RandomSource;

/// Number of hex characters in a confirmation key.
pub const KEY_HEX_LEN: usize = 16;

/// Public reference to a confirmation record, embedded in links.
///
/// Always [`KEY_HEX_LEN`] lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConfirmationKey(String);

impl ConfirmationKey {
    /// Parses a key received from a link or the command line.
    ///
    /// # Errors
    ///
    /// Returns [`ConfirmError::InputInvalid`] unless `value` is exactly
    /// [`KEY_HEX_LEN`] lowercase hex characters.
    pub fn parse(value: &str) -> ConfirmResult<Self> {
        let well_formed = value.len() == KEY_HEX_LEN
            && value
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !well_formed {
            return Err(ConfirmError::InputInvalid(format!(
                "confirmation key must be {KEY_HEX_LEN} lowercase hex characters"
            )));
        }
        Ok(Self(value.to_string()))
    }

    /// Truncates a hex digest to a key.
    pub(crate) fn from_digest(digest: &str) -> ConfirmResult<Self> {
        let prefix = digest.get(..KEY_HEX_LEN).ok_or_else(|| {
            ConfirmError::InputInvalid("digest shorter than a confirmation key".to_string())
        })?;
        Self::parse(prefix)
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfirmationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ConfirmationKey {
    type Error = ConfirmError;

    fn try_from(value: String) -> ConfirmResult<Self> {
        Self::parse(&value)
    }
}

impl From<ConfirmationKey> for String {
    fn from(key: ConfirmationKey) -> Self {
        key.0
    }
}

/// Secret confirmation token, stored as hex in cleartext at rest.
///
/// # Security
///
/// - The token is zeroized on drop.
/// - `Debug` never prints the value.
/// - Equality runs in constant time.
#[derive(Clone, Zeroize, ZeroizeOnDrop, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Draws `entropy_bytes` random bytes and hex encodes them.
    ///
    /// # Errors
    ///
    /// Returns [`ConfirmError::EntropyUnavailable`] if the random source fails.
    pub fn generate(random: &dyn RandomSource, entropy_bytes: usize) -> ConfirmResult<Self> {
        let mut bytes = random.next_bytes(entropy_bytes)?;
        let token = Self(hex::encode(&bytes));
        bytes.zeroize();
        Ok(token)
    }

    /// Wraps an existing token value.
    #[must_use]
    pub const fn from_hex(value: String) -> Self {
        Self(value)
    }

    /// Returns the token value. Treat this as sensitive material.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the token holds nothing but whitespace.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl Eq for Token {}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Token").field(&"[REDACTED]").finish()
    }
}

/// Identifies the handler to invoke once a confirmation concludes.
///
/// Without a `module`, `method` reads `<group>.<method>` and is resolved
/// against the registered capability groups. With a `module`, `method` is a
/// bare name exported by that module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerSelector {
    /// Optional module selector.
    pub module: Option<String>,
    /// Method selector.
    pub method: String,
}

impl HandlerSelector {
    /// Selects `method` of the capability group `group`.
    #[must_use]
    pub fn group(group: &str, method: &str) -> Self {
        Self {
            module: None,
            method: format!("{group}.{method}"),
        }
    }

    /// Selects `method` exported by `module`.
    #[must_use]
    pub fn module(module: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            module: Some(module.into()),
            method: method.into(),
        }
    }

    /// Selects a dotted `<group>.<method>` reference.
    #[must_use]
    pub fn qualified(method: impl Into<String>) -> Self {
        Self {
            module: None,
            method: method.into(),
        }
    }
}

impl fmt::Display for HandlerSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(module) = &self.module {
            write!(f, "{module}::")?;
        }
        f.write_str(&self.method)
    }
}

/// A deferred action awaiting external confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationRecord {
    /// Public reference, unique and immutable.
    pub key: ConfirmationKey,
    /// Secret token; `None` once the confirmation succeeded.
    pub token: Option<Token>,
    /// Handler invoked on every confirmation attempt.
    pub selector: HandlerSelector,
    /// Opaque payload forwarded to the handler.
    pub argument: String,
    /// Unix timestamp (seconds) after which the confirmation is expired.
    pub expires: Option<u64>,
    /// Unix timestamp (seconds) of the successful confirmation.
    pub confirmed: Option<u64>,
    /// Unix timestamp (seconds) of creation.
    pub created_at: u64,
}

impl ConfirmationRecord {
    /// Returns the token still awaiting confirmation. A blank token counts
    /// as consumed.
    #[must_use]
    pub fn pending_token(&self) -> Option<&Token> {
        self.token.as_ref().filter(|token| !token.is_blank())
    }

    /// Returns `true` once the token has been consumed.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.pending_token().is_none()
    }

    /// Returns `true` if the record carries an expiry that lies before `now`.
    #[must_use]
    pub fn is_expired(&self, now: u64) -> bool {
        self.expires.is_some_and(|expires| expires < now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_parse_accepts_lowercase_hex() {
        let key = ConfirmationKey::parse("0123456789abcdef").expect("key");
        assert_eq!(key.as_str(), "0123456789abcdef");
        assert_eq!(key.to_string(), "0123456789abcdef");
    }

    #[test]
    fn test_key_parse_rejects_malformed() {
        for value in ["", "0123456789abcde", "0123456789abcdef0", "0123456789ABCDEF", "0123456789abcdeg"] {
            assert!(
                matches!(ConfirmationKey::parse(value), Err(ConfirmError::InputInvalid(_))),
                "accepted {value:?}"
            );
        }
    }

    #[test]
    fn test_key_from_digest_truncates() {
        let digest = crate::hash::key_digest(b"random");
        let key = ConfirmationKey::from_digest(&digest).expect("key");
        assert_eq!(key.as_str(), &digest[..KEY_HEX_LEN]);
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = Token::from_hex("deadbeef".to_string());
        let debug = format!("{token:?}");
        assert!(!debug.contains("deadbeef"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_token_generate_hex_encodes() {
        let token = Token::generate(&crate::random::OsRandom, 256).expect("token");
        assert_eq!(token.expose().len(), 512);
        assert!(token.expose().bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn test_token_equality() {
        let a = Token::from_hex("abcd".to_string());
        assert_eq!(a, Token::from_hex("abcd".to_string()));
        assert_ne!(a, Token::from_hex("abce".to_string()));
        assert_ne!(a, Token::from_hex("abcdef".to_string()));
    }

    #[test]
    fn test_record_expiry_is_strict() {
        let record = ConfirmationRecord {
            key: ConfirmationKey::parse("0123456789abcdef").expect("key"),
            token: Some(Token::from_hex("abcd".to_string())),
            selector: HandlerSelector::group("user", "activate"),
            argument: String::new(),
            expires: Some(100),
            confirmed: None,
            created_at: 50,
        };
        assert!(!record.is_expired(99));
        assert!(!record.is_expired(100));
        assert!(record.is_expired(101));
        assert!(!record.is_confirmed());
    }

    #[test]
    fn test_blank_token_counts_as_consumed() {
        let mut record = ConfirmationRecord {
            key: ConfirmationKey::parse("0123456789abcdef").expect("key"),
            token: Some(Token::from_hex(" \t".to_string())),
            selector: HandlerSelector::group("user", "activate"),
            argument: String::new(),
            expires: None,
            confirmed: None,
            created_at: 0,
        };
        assert!(record.pending_token().is_none());
        assert!(record.is_confirmed());

        record.token = Some(Token::from_hex("abcd".to_string()));
        assert_eq!(record.pending_token().map(Token::expose), Some("abcd"));
        assert!(!record.is_confirmed());
    }

    #[test]
    fn test_selector_display() {
        assert_eq!(HandlerSelector::group("user", "activate").to_string(), "user.activate");
        assert_eq!(HandlerSelector::module("mailer", "send").to_string(), "mailer::send");
    }
}
