//! WeNe PoP — the Proof-of-Participation signer (spec §4.F): an
//! Ed25519-signed, 169-byte message anchoring off-chain audit state for
//! on-chain consumption, chained per grant with a dedicated lock.

pub mod chain;
pub mod config;
pub mod error;
pub mod message;
pub mod service;

pub use chain::PopChainStore;
pub use config::{PopSigner, PopSignerConfig, SignerState};
pub use error::{PopError, PopResult};
pub use message::{build_message, SignableFields, POP_MESSAGE_LEN, POP_MESSAGE_VERSION};
pub use service::{recompute_entry_hash_hex, PopService};
