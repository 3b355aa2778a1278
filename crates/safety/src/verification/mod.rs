/// Barcode resolution
pub mod barcode;

/// Five Rights verification
pub mod verifier;

pub use barcode::{BarcodeIndex, BarcodeResolver};
pub use verifier::{
    AdministrationVerifier, Check, VerificationIssue, VerificationRequest, VerificationResult,
};
