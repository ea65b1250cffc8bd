//! WeNe Search — the master-only disclosure graph and search index
//! (spec §4.H): transfer-audit projection, per-admin disclosure rollup,
//! tokenized prefix search, and a 30-second-TTL in-process index cache.

pub mod cache;
pub mod disclosure;
pub mod error;
pub mod index;
pub mod service;
pub mod tokenize;
pub mod transfer;

pub use disclosure::{AdminDisclosure, RelatedUser};
pub use error::{SearchError, SearchResult};
pub use index::{DocKind, SearchDoc, SearchIndex};
pub use service::SearchService;
pub use transfer::{project_transfer, TransferAuditPayload};
