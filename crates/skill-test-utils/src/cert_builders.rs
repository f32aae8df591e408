//! Certificate chain builders for signature verification tests
//!
//! Builds a root -> intermediate -> vendor leaf chain out of the fixed keys in
//! [`crate::crypto_fixtures`]. Validity windows and the leaf common name are
//! adjustable so tests can produce expired, not-yet-valid and mis-named
//! certificates that still chain correctly.

use crate::crypto_fixtures::{
    FixtureError, INTERMEDIATE_CA_KEY_PEM, ROOT_CA_KEY_PEM, VENDOR_KEY_PEM,
};
use rcgen::{
    date_time_ymd, BasicConstraints, Certificate, CertificateParams, DistinguishedName, DnType,
    IsCa, KeyPair, KeyUsagePurpose,
};

/// Common name the voice platform's signing certificate carries.
pub const VENDOR_COMMON_NAME: &str = "echo-api.amazon.com";

/// A certificate URL that passes the trusted-location check.
pub const TRUSTED_CERT_URL: &str = "https://s3.amazonaws.com/echo.api/echo-api-cert-12.pem";

/// Calendar date used for validity bounds.
pub type Ymd = (i32, u8, u8);

/// Validity window that contains "now" for the foreseeable future.
pub const CURRENT_WINDOW: (Ymd, Ymd) = ((2020, 1, 1), (2049, 12, 31));

/// Validity window entirely in the past.
pub const EXPIRED_WINDOW: (Ymd, Ymd) = ((2018, 1, 1), (2021, 1, 1));

/// Validity window entirely in the future.
pub const FUTURE_WINDOW: (Ymd, Ymd) = ((2045, 1, 1), (2049, 12, 31));

fn key_pair(pem: &str) -> Result<KeyPair, FixtureError> {
    KeyPair::from_pem(pem).map_err(|e| FixtureError::Crypto(format!("Failed to load key: {e}")))
}

fn named_params(common_name: &str, window: (Ymd, Ymd)) -> Result<CertificateParams, FixtureError> {
    let mut params = CertificateParams::new(vec![common_name.to_string()])
        .map_err(|e| FixtureError::Certificate(e.to_string()))?;
    let mut name = DistinguishedName::new();
    name.push(DnType::CommonName, common_name);
    params.distinguished_name = name;
    let ((by, bm, bd), (ay, am, ad)) = window;
    params.not_before = date_time_ymd(by, bm, bd);
    params.not_after = date_time_ymd(ay, am, ad);
    Ok(params)
}

fn ca_params(common_name: &str, window: (Ymd, Ymd)) -> Result<CertificateParams, FixtureError> {
    let mut params = named_params(common_name, window)?;
    params.subject_alt_names = Vec::new();
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![
        KeyUsagePurpose::KeyCertSign,
        KeyUsagePurpose::CrlSign,
        KeyUsagePurpose::DigitalSignature,
    ];
    Ok(params)
}

/// Test PKI: a self-signed root and an intermediate it issued.
pub struct TestPki {
    root: Certificate,
    root_key: KeyPair,
    intermediate: Certificate,
    intermediate_key: KeyPair,
}

impl TestPki {
    /// Build the root and intermediate with current validity windows.
    pub fn new() -> Result<Self, FixtureError> {
        Self::with_intermediate_window(CURRENT_WINDOW)
    }

    /// Build the PKI with a custom intermediate validity window.
    pub fn with_intermediate_window(window: (Ymd, Ymd)) -> Result<Self, FixtureError> {
        let root_key = key_pair(ROOT_CA_KEY_PEM)?;
        let root = ca_params("Skill Gate Test Root CA", CURRENT_WINDOW)?
            .self_signed(&root_key)
            .map_err(|e| FixtureError::Certificate(e.to_string()))?;

        let intermediate_key = key_pair(INTERMEDIATE_CA_KEY_PEM)?;
        let intermediate = ca_params("Skill Gate Test Intermediate CA", window)?
            .signed_by(&intermediate_key, &root, &root_key)
            .map_err(|e| FixtureError::Certificate(e.to_string()))?;

        Ok(Self {
            root,
            root_key,
            intermediate,
            intermediate_key,
        })
    }

    /// PEM of the root certificate (the trust anchor bundle).
    pub fn root_pem(&self) -> String {
        self.root.pem()
    }

    /// DER of the root certificate.
    pub fn root_der(&self) -> Vec<u8> {
        self.root.der().to_vec()
    }

    /// Start building a vendor signing certificate under this PKI.
    pub fn vendor(&self) -> VendorCertBuilder<'_> {
        VendorCertBuilder {
            pki: self,
            common_name: VENDOR_COMMON_NAME.to_string(),
            window: CURRENT_WINDOW,
            key_pem: VENDOR_KEY_PEM,
            direct_from_root: false,
        }
    }
}

/// A built vendor certificate in the shapes the certificate host serves.
#[derive(Debug, Clone)]
pub struct VendorCertificate {
    /// Leaf DER only.
    pub leaf_der: Vec<u8>,

    /// Leaf PEM followed by the intermediate PEM, as the platform publishes it.
    pub chain_pem: String,
}

/// Builder for the vendor's request-signing certificate.
pub struct VendorCertBuilder<'a> {
    pki: &'a TestPki,
    common_name: String,
    window: (Ymd, Ymd),
    key_pem: &'static str,
    direct_from_root: bool,
}

impl VendorCertBuilder<'_> {
    /// Override the subject common name.
    pub fn common_name(mut self, common_name: &str) -> Self {
        self.common_name = common_name.to_string();
        self
    }

    /// Override the validity window.
    pub fn validity(mut self, window: (Ymd, Ymd)) -> Self {
        self.window = window;
        self
    }

    /// Use a different subject key (e.g. to mismatch the request signer).
    pub fn subject_key(mut self, key_pem: &'static str) -> Self {
        self.key_pem = key_pem;
        self
    }

    /// Issue the leaf directly from the root, with no intermediate in the bundle.
    pub fn issued_by_root(mut self) -> Self {
        self.direct_from_root = true;
        self
    }

    /// Issue the leaf certificate.
    pub fn build(self) -> Result<VendorCertificate, FixtureError> {
        let leaf_key = key_pair(self.key_pem)?;
        let mut params = named_params(&self.common_name, self.window)?;
        params.key_usages = vec![KeyUsagePurpose::DigitalSignature];

        let leaf = if self.direct_from_root {
            params.signed_by(&leaf_key, &self.pki.root, &self.pki.root_key)
        } else {
            params.signed_by(&leaf_key, &self.pki.intermediate, &self.pki.intermediate_key)
        }
        .map_err(|e| FixtureError::Certificate(e.to_string()))?;

        let chain_pem = if self.direct_from_root {
            leaf.pem()
        } else {
            format!("{}{}", leaf.pem(), self.pki.intermediate.pem())
        };

        Ok(VendorCertificate {
            leaf_der: leaf.der().to_vec(),
            chain_pem,
        })
    }
}

/// A self-signed certificate with the vendor's name, outside any test PKI.
pub fn self_signed_vendor_pem(key_pem: &str) -> Result<String, FixtureError> {
    let key = key_pair(key_pem)?;
    let cert = named_params(VENDOR_COMMON_NAME, CURRENT_WINDOW)?
        .self_signed(&key)
        .map_err(|e| FixtureError::Certificate(e.to_string()))?;
    Ok(cert.pem())
}
