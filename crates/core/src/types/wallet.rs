//! Wallet address and transaction hash types.
//!
//! Both are opaque, format-validated strings. The settlement service never
//! derives anything from them beyond equality and storage - the transaction
//! hash in particular is an idempotency token, not a parsed chain artifact.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`WalletAddress`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum WalletAddressError {
    /// The input string is empty.
    #[error("wallet address cannot be empty")]
    Empty,
    /// The input does not start with the `0x` prefix.
    #[error("wallet address must start with 0x")]
    MissingPrefix,
    /// The input is not 42 characters long.
    #[error("wallet address must be exactly {expected} characters, got {actual}")]
    WrongLength {
        /// Required total length including the `0x` prefix.
        expected: usize,
        /// Length of the rejected input.
        actual: usize,
    },
    /// The address body contains a non-hexadecimal character.
    #[error("wallet address must be hexadecimal after the 0x prefix")]
    NotHex,
}

/// An EVM wallet address (`0x` + 40 hex characters).
///
/// The address is stored exactly as supplied; no checksum normalization is
/// applied, so two casings of the same address are distinct users.
///
/// ## Examples
///
/// ```
/// use stablefront_core::WalletAddress;
///
/// assert!(WalletAddress::parse("0x742d35Cc6634C0532925a3b844Bc454e4438f44e").is_ok());
/// assert!(WalletAddress::parse("742d35Cc6634C0532925a3b844Bc454e4438f44e").is_err());
/// assert!(WalletAddress::parse("0x1234").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Total length of an address string including the `0x` prefix.
    pub const LENGTH: usize = 42;

    /// Parse a `WalletAddress` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input:
    /// - Is empty
    /// - Does not start with `0x`
    /// - Is not exactly 42 characters
    /// - Contains non-hex characters after the prefix
    pub fn parse(s: &str) -> Result<Self, WalletAddressError> {
        if s.is_empty() {
            return Err(WalletAddressError::Empty);
        }

        let Some(body) = s.strip_prefix("0x") else {
            return Err(WalletAddressError::MissingPrefix);
        };

        if s.len() != Self::LENGTH {
            return Err(WalletAddressError::WrongLength {
                expected: Self::LENGTH,
                actual: s.len(),
            });
        }

        if !body.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(WalletAddressError::NotHex);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened display form, e.g. `0x742d...f44e`.
    #[must_use]
    pub fn truncated(&self) -> String {
        let (head, _) = self.0.split_at(6);
        let (_, tail) = self.0.split_at(self.0.len() - 4);
        format!("{head}...{tail}")
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors that can occur when parsing a [`TxHash`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum TxHashError {
    /// The input string is empty.
    #[error("transaction hash cannot be empty")]
    Empty,
    /// The input does not start with the `0x` prefix.
    #[error("transaction hash must start with 0x")]
    MissingPrefix,
    /// The input is not 66 characters long.
    #[error("transaction hash must be exactly {expected} characters, got {actual}")]
    WrongLength {
        /// Required total length including the `0x` prefix.
        expected: usize,
        /// Length of the rejected input.
        actual: usize,
    },
    /// The hash body contains a non-hexadecimal character.
    #[error("transaction hash must be hexadecimal after the 0x prefix")]
    NotHex,
}

/// An EVM transaction hash (`0x` + 64 hex characters).
///
/// Used as the settlement idempotency key: each completed settlement owns
/// exactly one transaction hash, enforced by a storage uniqueness constraint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TxHash(String);

impl TxHash {
    /// Total length of a transaction hash string including the `0x` prefix.
    pub const LENGTH: usize = 66;

    /// Parse a `TxHash` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input:
    /// - Is empty
    /// - Does not start with `0x`
    /// - Is not exactly 66 characters
    /// - Contains non-hex characters after the prefix
    pub fn parse(s: &str) -> Result<Self, TxHashError> {
        if s.is_empty() {
            return Err(TxHashError::Empty);
        }

        let Some(body) = s.strip_prefix("0x") else {
            return Err(TxHashError::MissingPrefix);
        };

        if s.len() != Self::LENGTH {
            return Err(TxHashError::WrongLength {
                expected: Self::LENGTH,
                actual: s.len(),
            });
        }

        if !body.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TxHashError::NotHex);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the hash as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";

    fn tx(fill: char) -> String {
        format!("0x{}", fill.to_string().repeat(64))
    }

    #[test]
    fn parses_valid_address() {
        let addr = WalletAddress::parse(ADDR).expect("valid address");
        assert_eq!(addr.as_str(), ADDR);
    }

    #[test]
    fn preserves_case_as_supplied() {
        let lower = WalletAddress::parse(&ADDR.to_lowercase()).expect("valid address");
        let mixed = WalletAddress::parse(ADDR).expect("valid address");
        assert_ne!(lower, mixed);
    }

    #[test]
    fn rejects_bad_addresses() {
        assert!(matches!(
            WalletAddress::parse(""),
            Err(WalletAddressError::Empty)
        ));
        assert!(matches!(
            WalletAddress::parse("742d35Cc6634C0532925a3b844Bc454e4438f44e"),
            Err(WalletAddressError::MissingPrefix)
        ));
        assert!(matches!(
            WalletAddress::parse("0x1234"),
            Err(WalletAddressError::WrongLength { .. })
        ));
        assert!(matches!(
            WalletAddress::parse("0xZZ2d35Cc6634C0532925a3b844Bc454e4438f44e"),
            Err(WalletAddressError::NotHex)
        ));
    }

    #[test]
    fn truncated_address() {
        let addr = WalletAddress::parse(ADDR).expect("valid address");
        assert_eq!(addr.truncated(), "0x742d...f44e");
    }

    #[test]
    fn parses_valid_tx_hash() {
        let hash = TxHash::parse(&tx('a')).expect("valid hash");
        assert_eq!(hash.as_str(), tx('a'));
    }

    #[test]
    fn rejects_bad_tx_hashes() {
        assert!(matches!(TxHash::parse(""), Err(TxHashError::Empty)));
        assert!(matches!(
            TxHash::parse("abc123"),
            Err(TxHashError::MissingPrefix)
        ));
        assert!(matches!(
            TxHash::parse("0xdeadbeef"),
            Err(TxHashError::WrongLength { .. })
        ));
        assert!(matches!(TxHash::parse(&tx('g')), Err(TxHashError::NotHex)));
    }
}
