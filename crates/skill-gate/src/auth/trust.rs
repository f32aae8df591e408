//! Certificate chain building against a fixed set of trust anchors.
//!
//! Starting at the leaf, each step finds the certificate that issued the
//! current one (matching issuer/subject names and a verifying signature)
//! among the trust anchors and the intermediates shipped in the bundle.
//!
//! # Revocation
//!
//! Revocation is not checked. [`RevocationMode`] has a single variant and is
//! carried in configuration so the choice is explicit and visible at startup.

use crate::auth::certificate::{parse_complete, Certificate};
use ring::signature::{self, UnparsedPublicKey, VerificationAlgorithm};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use x509_parser::pem::Pem;
use x509_parser::prelude::*;

/// Maximum number of issuer links followed from the leaf.
pub const MAX_CHAIN_DEPTH: usize = 5;

/// How certificate revocation is handled during chain building.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RevocationMode {
    /// Revocation status is not consulted.
    #[default]
    NoCheck,
}

impl RevocationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevocationMode::NoCheck => "none",
        }
    }
}

impl FromStr for RevocationMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(RevocationMode::NoCheck),
            _ => Err(()),
        }
    }
}

/// Errors loading the trust anchor bundle.
#[derive(Debug, Error)]
pub enum TrustAnchorError {
    #[error("Failed to read trust anchors: {0}")]
    Io(String),

    #[error("Invalid trust anchor: {0}")]
    Parse(String),

    #[error("Trust anchor bundle contains no certificates")]
    Empty,
}

/// Reasons a chain could not be built.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("Malformed certificate in chain: {0}")]
    Malformed(String),

    #[error("No issuer found for certificate at depth {0}")]
    IssuerNotFound(usize),

    #[error("Issuer at depth {0} is outside its validity window")]
    IssuerNotValid(usize),

    #[error("Unsupported certificate signature algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Certificate signature does not verify against issuer key")]
    InvalidSignature,

    #[error("Chain exceeds maximum depth of {MAX_CHAIN_DEPTH}")]
    TooDeep,
}

/// Root certificates a signing certificate must chain to.
#[derive(Debug, Clone)]
pub struct TrustAnchors {
    anchors: Vec<Vec<u8>>,
}

impl TrustAnchors {
    /// Load anchors from a PEM bundle on disk.
    pub fn from_pem_file(path: &Path) -> Result<Self, TrustAnchorError> {
        let bytes = std::fs::read(path)
            .map_err(|e| TrustAnchorError::Io(format!("{}: {e}", path.display())))?;
        Self::from_pem(&bytes)
    }

    /// Load anchors from PEM text holding one or more certificates.
    pub fn from_pem(pem: &[u8]) -> Result<Self, TrustAnchorError> {
        let mut anchors = Vec::new();
        for block in Pem::iter_from_buffer(pem) {
            let block = block.map_err(|e| TrustAnchorError::Parse(e.to_string()))?;
            if block.label == "CERTIFICATE" {
                anchors.push(block.contents);
            }
        }
        Self::from_der(anchors)
    }

    /// Build from DER certificates.
    pub fn from_der(anchors: Vec<Vec<u8>>) -> Result<Self, TrustAnchorError> {
        if anchors.is_empty() {
            return Err(TrustAnchorError::Empty);
        }
        for der in &anchors {
            parse_complete(der).map_err(|e| TrustAnchorError::Parse(e.to_string()))?;
        }
        Ok(Self { anchors })
    }

    /// Number of anchors.
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Build a chain from `cert` to one of the anchors at time `now`.
    ///
    /// Returns the number of issuer links followed.
    pub fn build_chain(
        &self,
        cert: &Certificate,
        now: i64,
        revocation: RevocationMode,
    ) -> Result<usize, ChainError> {
        match revocation {
            RevocationMode::NoCheck => {
                tracing::debug!(target: "gate.auth.chain", revocation = revocation.as_str(), "Revocation checking disabled");
            }
        }

        let leaf = parse_for_chain(cert.der())?;
        let intermediates = cert
            .intermediates()
            .iter()
            .map(|der| parse_for_chain(der))
            .collect::<Result<Vec<_>, _>>()?;
        let anchors = self
            .anchors
            .iter()
            .map(|der| parse_for_chain(der))
            .collect::<Result<Vec<_>, _>>()?;

        let mut current = &leaf;
        for depth in 0..MAX_CHAIN_DEPTH {
            if anchors
                .iter()
                .any(|anchor| anchor.tbs_certificate.as_ref() == current.tbs_certificate.as_ref())
            {
                return Ok(depth);
            }

            if let Some(anchor) = anchors.iter().find(|a| issued_by(current, a)) {
                if !valid_at(anchor, now) {
                    return Err(ChainError::IssuerNotValid(depth + 1));
                }
                return Ok(depth + 1);
            }

            let issuer = intermediates
                .iter()
                .find(|i| is_ca(i) && issued_by(current, i))
                .ok_or(ChainError::IssuerNotFound(depth))?;

            if !valid_at(issuer, now) {
                return Err(ChainError::IssuerNotValid(depth + 1));
            }
            current = issuer;
        }

        Err(ChainError::TooDeep)
    }
}

fn parse_for_chain(der: &[u8]) -> Result<X509Certificate<'_>, ChainError> {
    parse_complete(der).map_err(|e| ChainError::Malformed(e.to_string()))
}

fn valid_at(cert: &X509Certificate<'_>, now: i64) -> bool {
    let validity = cert.validity();
    validity.not_before.timestamp() <= now && now <= validity.not_after.timestamp()
}

fn is_ca(cert: &X509Certificate<'_>) -> bool {
    cert.basic_constraints()
        .ok()
        .flatten()
        .is_some_and(|bc| bc.value.ca)
}

/// True when `issuer`'s subject matches `child`'s issuer and its key verifies
/// `child`'s signature.
fn issued_by(child: &X509Certificate<'_>, issuer: &X509Certificate<'_>) -> bool {
    if child.issuer().as_raw() != issuer.subject().as_raw() {
        return false;
    }
    match verify_signature(child, issuer) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(target: "gate.auth.chain", error = %e, "Candidate issuer rejected");
            false
        }
    }
}

fn verify_signature(
    child: &X509Certificate<'_>,
    issuer: &X509Certificate<'_>,
) -> Result<(), ChainError> {
    let oid = child.signature_algorithm.algorithm.to_id_string();
    let algorithm: &'static dyn VerificationAlgorithm = match oid.as_str() {
        // sha256/384/512 WithRSAEncryption
        "1.2.840.113549.1.1.11" => &signature::RSA_PKCS1_2048_8192_SHA256,
        "1.2.840.113549.1.1.12" => &signature::RSA_PKCS1_2048_8192_SHA384,
        "1.2.840.113549.1.1.13" => &signature::RSA_PKCS1_2048_8192_SHA512,
        // ecdsa-with-SHA256/384
        "1.2.840.10045.4.3.2" => &signature::ECDSA_P256_SHA256_ASN1,
        "1.2.840.10045.4.3.3" => &signature::ECDSA_P384_SHA384_ASN1,
        other => return Err(ChainError::UnsupportedAlgorithm(other.to_string())),
    };

    let issuer_key = UnparsedPublicKey::new(algorithm, &*issuer.public_key().subject_public_key.data);
    issuer_key
        .verify(child.tbs_certificate.as_ref(), &child.signature_value.data)
        .map_err(|_| ChainError::InvalidSignature)
}
