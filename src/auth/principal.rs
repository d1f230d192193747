// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Principal identifiers.
//!
//! A principal is an opaque byte string of at most 29 bytes. Its textual
//! form is the big-endian CRC32 of the bytes followed by the bytes
//! themselves, base32-encoded (lowercase, unpadded) and grouped into
//! five-character chunks separated by `-`.

use std::fmt;
use std::str::FromStr;

use data_encoding::BASE32_NOPAD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha224};

const CRC_LENGTH: usize = 4;
const MAX_LENGTH_IN_BYTES: usize = 29;
const GROUP_LENGTH: usize = 5;

const SELF_AUTHENTICATING_TAG: u8 = 0x02;
const DERIVED_TAG: u8 = 0x03;
const ANONYMOUS_TAG: u8 = 0x04;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrincipalError {
    #[error("Principal text is not valid base32: {0}")]
    InvalidEncoding(String),

    #[error("Principal text is too short")]
    TooShort,

    #[error("Principal is longer than {MAX_LENGTH_IN_BYTES} bytes")]
    TooLong,

    #[error("Principal checksum does not match")]
    ChecksumMismatch,

    #[error("Principal text is not in canonical form (expected {0})")]
    NotCanonical(String),

    #[error("Derivation domain is {0} bytes, at most 255 are allowed")]
    DomainTooLong(usize),
}

/// An authenticated caller's principal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Principal(Vec<u8>);

impl Principal {
    /// Principal owned by whoever holds the private key of `der_public_key`.
    pub fn self_authenticating(der_public_key: &[u8]) -> Self {
        let mut bytes = Sha224::digest(der_public_key).to_vec();
        bytes.push(SELF_AUTHENTICATING_TAG);
        Self(bytes)
    }

    /// Principal derived from an external identifier within `domain`.
    ///
    /// The domain is length-prefixed with a single byte.
    pub fn derived(domain: &str, seed: &[u8]) -> Result<Self, PrincipalError> {
        let domain_len =
            u8::try_from(domain.len()).map_err(|_| PrincipalError::DomainTooLong(domain.len()))?;
        let mut hasher = Sha224::new();
        hasher.update([domain_len]);
        hasher.update(domain.as_bytes());
        hasher.update(seed);
        let mut bytes = hasher.finalize().to_vec();
        bytes.push(DERIVED_TAG);
        Ok(Self(bytes))
    }

    /// The unauthenticated caller.
    pub fn anonymous() -> Self {
        Self(vec![ANONYMOUS_TAG])
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, PrincipalError> {
        if bytes.len() > MAX_LENGTH_IN_BYTES {
            return Err(PrincipalError::TooLong);
        }
        Ok(Self(bytes.to_vec()))
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn is_anonymous(&self) -> bool {
        self.0 == [ANONYMOUS_TAG]
    }

    pub fn to_text(&self) -> String {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&self.0);
        let checksum = hasher.finalize();

        let mut buf = Vec::with_capacity(CRC_LENGTH + self.0.len());
        buf.extend_from_slice(&checksum.to_be_bytes());
        buf.extend_from_slice(&self.0);

        let encoded = BASE32_NOPAD.encode(&buf).to_ascii_lowercase();
        let mut text = String::with_capacity(encoded.len() + encoded.len() / GROUP_LENGTH);
        for (i, c) in encoded.chars().enumerate() {
            if i > 0 && i % GROUP_LENGTH == 0 {
                text.push('-');
            }
            text.push(c);
        }
        text
    }

    pub fn from_text(text: &str) -> Result<Self, PrincipalError> {
        let compact: String = text
            .chars()
            .filter(|c| *c != '-')
            .map(|c| c.to_ascii_uppercase())
            .collect();
        let decoded = BASE32_NOPAD
            .decode(compact.as_bytes())
            .map_err(|e| PrincipalError::InvalidEncoding(e.to_string()))?;

        if decoded.len() < CRC_LENGTH {
            return Err(PrincipalError::TooShort);
        }
        let (checksum, bytes) = decoded.split_at(CRC_LENGTH);
        let principal = Self::from_slice(bytes)?;

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(bytes);
        if hasher.finalize().to_be_bytes() != checksum {
            return Err(PrincipalError::ChecksumMismatch);
        }

        let canonical = principal.to_text();
        if canonical != text {
            return Err(PrincipalError::NotCanonical(canonical));
        }
        Ok(principal)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl FromStr for Principal {
    type Err = PrincipalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Principal::from_text(s)
    }
}

impl Serialize for Principal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_text())
    }
}

impl<'de> Deserialize<'de> for Principal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Principal::from_text(&text).map_err(serde::de::Error::custom)
    }
}
