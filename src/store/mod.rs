//! Storage: ports plus the Postgres and in-memory adapters.

pub mod memory;
pub mod ports;
pub mod postgres;

pub use memory::MemoryStore;
pub use ports::{
    AccessStore, AssessmentStore, AuditStore, CatalogStore, CommerceStore, CompletedPaymentWrite,
    IdentityStore, MediaStore, PayoutStore, ProgressStore, ReviewStore, Store,
    SubscriptionActivation,
};
pub use postgres::PostgresStore;
