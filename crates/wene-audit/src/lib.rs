//! WeNe audit — the hash-chained, immutably-mirrored audit log at the
//! center of the participation ledger (spec §4.B, §4.C).
//!
//! Every mutating request passes through [`chain::AuditChain::append`],
//! which holds the single process-wide audit lock across the read-heads,
//! hash computation, immutable fan-out, and pointer-advance steps — this
//! is what makes the immutable receipt atomic with the chain advance
//! (spec §5).

pub mod chain;
pub mod error;
pub mod sinks;

pub use chain::{AuditChain, IntegrityReport};
pub use error::{AuditError, AuditResult};
pub use sinks::{
    fan_out, HttpIngestSink, ImmutableSinkSet, KvIndexSink, ObjectPutOutcome, ObjectStoreSink,
    ReqwestIngestSink,
};
