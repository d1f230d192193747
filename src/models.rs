// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Workflow Data Models
//!
//! Wire and cache types shared by the claims, underwriting and profile
//! workflows. Everything here that carries remote state is authoritative only
//! as fetched: the client never transitions a [`Claim`] or an
//! [`UnderwritingResult`] locally, it re-fetches.
//!
//! ## Model Categories
//!
//! - **Claims**: submitted insurance claims and processing outcomes
//! - **Documents**: underwriting documents, staged locally then uploaded
//! - **Underwriting**: the per-account quotation result
//! - **Profile**: account summary and premium payments

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

// =============================================================================
// Claims
// =============================================================================

/// Opaque claim identifier assigned by the remote service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct ClaimId(pub String);

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ClaimId {
    fn from(value: &str) -> Self {
        ClaimId(value.to_string())
    }
}

impl From<String> for ClaimId {
    fn from(value: String) -> Self {
        ClaimId(value)
    }
}

/// A claim description that is known to be non-empty.
///
/// Construction is the only validation point for claim submission, so a
/// `ClaimDescription` can be handed to the gateway without further checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ClaimDescription(String);

impl ClaimDescription {
    /// Validate a description. Blank (empty or whitespace-only) text is rejected.
    pub fn parse(text: impl Into<String>) -> Result<Self, ClientError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ClientError::Validation(
                "claim description must not be empty".to_string(),
            ));
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Processing state of a claim, as reported by the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimStatus {
    Submitted,
    Processing,
    Approved,
    Rejected,
}

impl ClaimStatus {
    /// Whether the remote service may still move this claim to another status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ClaimStatus::Approved | ClaimStatus::Rejected)
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimStatus::Submitted => write!(f, "Submitted"),
            ClaimStatus::Processing => write!(f, "Processing"),
            ClaimStatus::Approved => write!(f, "Approved"),
            ClaimStatus::Rejected => write!(f, "Rejected"),
        }
    }
}

/// An insurance claim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub id: ClaimId,
    pub description: String,
    pub status: ClaimStatus,
    pub submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
}

/// Result of asking the remote service to process a claim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClaimOutcome {
    pub claim_id: ClaimId,
    pub status: ClaimStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Local read-through view of the caller's claims, keyed by id.
pub type ClaimCache = BTreeMap<ClaimId, Claim>;

// =============================================================================
// Documents
// =============================================================================

/// Kind of underwriting document. The set is open: unknown kinds
/// round-trip through [`DocType::Other`].
///
/// Every value is built through `From<String>`, so a well-known name always
/// maps to its own variant and two equal names are always equal keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DocType {
    FinancialAudit,
    ScannedForm,
    OperationLicense,
    Other(CustomDocType),
}

/// Name of a document kind outside the well-known set. Only obtainable
/// from [`DocType::from`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CustomDocType(String);

impl CustomDocType {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl DocType {
    pub fn as_str(&self) -> &str {
        match self {
            DocType::FinancialAudit => "FinancialAudit",
            DocType::ScannedForm => "ScannedForm",
            DocType::OperationLicense => "OperationLicense",
            DocType::Other(name) => name.as_str(),
        }
    }
}

impl From<String> for DocType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "FinancialAudit" => DocType::FinancialAudit,
            "ScannedForm" => DocType::ScannedForm,
            "OperationLicense" => DocType::OperationLicense,
            _ => DocType::Other(CustomDocType(value)),
        }
    }
}

impl From<&str> for DocType {
    fn from(value: &str) -> Self {
        DocType::from(value.to_string())
    }
}

impl From<DocType> for String {
    fn from(value: DocType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque document identifier assigned by the remote service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct DocumentId(pub String);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A document that is part of the remote, authoritative document set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub doc_type: DocType,
    #[serde(with = "base64_bytes")]
    pub content: Vec<u8>,
    pub uploaded_at: DateTime<Utc>,
}

/// A document held locally until it is uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedDocument {
    pub doc_type: DocType,
    pub content: Vec<u8>,
    pub staged_at: DateTime<Utc>,
    /// Monotonic staging counter; distinguishes a re-staged payload from the
    /// one an in-flight upload read.
    pub revision: u64,
}

// =============================================================================
// Underwriting
// =============================================================================

/// A currency amount in minor units (cents).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyAmount {
    pub currency: String,
    pub minor_units: u64,
}

impl CurrencyAmount {
    /// Format as `<currency> <whole>.<cents>`.
    pub fn formatted(&self) -> String {
        format!(
            "{} {}.{:02}",
            self.currency,
            self.minor_units / 100,
            self.minor_units % 100
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnderwritingStatus {
    Pending,
    Approved,
    Denied,
}

/// Server-computed underwriting decision for the caller's account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UnderwritingResult {
    pub status: UnderwritingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quotation: Option<CurrencyAmount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

// =============================================================================
// Profile
// =============================================================================

/// Account summary returned by `getUserInfo`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub account_type: String,
    #[serde(default)]
    pub total_policies: u32,
    #[serde(default)]
    pub active_policies: u32,
    #[serde(default)]
    pub total_claims: u32,
}

/// A premium payment recorded against one of the caller's policies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PremiumTransaction {
    pub id: String,
    pub policy_id: String,
    pub amount: CurrencyAmount,
    pub paid_at: DateTime<Utc>,
}

/// Serde adapter carrying binary payloads as standard base64 strings.
pub(crate) mod base64_bytes {
    use data_encoding::BASE64;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S, T>(bytes: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: AsRef<[u8]>,
    {
        serializer.serialize_str(&BASE64.encode(bytes.as_ref()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        BASE64
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
