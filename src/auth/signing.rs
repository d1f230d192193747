// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Local chain account keys.
//!
//! Headless hosts have no injected chain wallet; they hold the account key
//! as a PEM file instead. This module turns that PEM into an alloy signer.

use std::path::Path;

use alloy::signers::local::PrivateKeySigner;
use k256::SecretKey;

use super::error::AuthError;

/// Parse a private key from PEM format to hex string.
///
/// Accepts SEC1 (`EC PRIVATE KEY`) and PKCS#8 (`PRIVATE KEY`) encodings.
///
/// # Returns
/// * `Ok(String)` - Hex-encoded private key (64 characters, no 0x prefix)
/// * `Err(AuthError)` - If PEM parsing fails
pub fn pem_to_hex(pem_bytes: &[u8]) -> Result<String, AuthError> {
    let pem_str = std::str::from_utf8(pem_bytes)
        .map_err(|e| AuthError::InvalidCredential(format!("Invalid UTF-8: {e}")))?;

    let pem = pem::parse(pem_str)
        .map_err(|e| AuthError::InvalidCredential(format!("Invalid PEM: {e}")))?;

    let secret_key = SecretKey::from_sec1_der(pem.contents())
        .or_else(|_| parse_pkcs8_to_secret_key(pem.contents()))
        .map_err(|e| AuthError::InvalidCredential(format!("Invalid key format: {e}")))?;

    Ok(alloy::hex::encode(secret_key.to_bytes()))
}

fn parse_pkcs8_to_secret_key(der: &[u8]) -> Result<SecretKey, String> {
    use k256::pkcs8::DecodePrivateKey;
    SecretKey::from_pkcs8_der(der).map_err(|e| e.to_string())
}

/// Create a signer from a hex private key (no 0x prefix).
pub fn signer_from_hex(private_key_hex: &str) -> Result<PrivateKeySigner, AuthError> {
    let key_bytes = alloy::hex::decode(private_key_hex)
        .map_err(|e| AuthError::InvalidCredential(format!("Invalid private key: {e}")))?;

    PrivateKeySigner::from_slice(&key_bytes)
        .map_err(|e| AuthError::InvalidCredential(format!("Invalid private key: {e}")))
}

/// Create a signer from PEM-encoded private key bytes.
pub fn signer_from_pem(pem_bytes: &[u8]) -> Result<PrivateKeySigner, AuthError> {
    let hex_key = pem_to_hex(pem_bytes)?;
    signer_from_hex(&hex_key)
}

/// Load a signer from a PEM file on disk.
pub fn signer_from_pem_file(path: impl AsRef<Path>) -> Result<PrivateKeySigner, AuthError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| {
        AuthError::InvalidCredential(format!("Cannot read key file {}: {e}", path.display()))
    })?;
    signer_from_pem(&bytes)
}
