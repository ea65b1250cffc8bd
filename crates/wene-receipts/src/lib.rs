//! WeNe receipts — the participation-receipt and claim protocol (spec §4.D,
//! §4.E): confirmation-code reservation, claim submission, receipt issuance
//! and verification, participant user-id registration.

pub mod claim;
pub mod codes;
pub mod error;
pub mod receipts;
pub mod users;

pub use claim::{ClaimChannel, ClaimService};
pub use codes::{CodeGenerator, ConfirmationCodeIndexEntry, ConfirmationCodeReservation, RandomCodeGenerator};
pub use error::{ReceiptError, ReceiptResult};
pub use receipts::{subject_commitment, verify_receipt, ReceiptStore, VerificationChecks, VerificationResult};
pub use users::UserRegistry;
