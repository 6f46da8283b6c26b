//! Storage ports.
//!
//! Each trait covers one aggregate. Methods whose names start with
//! `apply_` or that write several rows are atomic in every adapter: a
//! transaction in Postgres, a single critical section in memory.

mod assessments;
mod audit;
mod catalog;
mod commerce;
mod identity;
mod media;
mod payouts;
mod progress;
mod reviews;

pub use assessments::AssessmentStore;
pub use audit::AuditStore;
pub use catalog::CatalogStore;
pub use commerce::{CommerceStore, CompletedPaymentWrite, SubscriptionActivation};
pub use identity::{AccessStore, IdentityStore};
pub use media::MediaStore;
pub use payouts::PayoutStore;
pub use progress::ProgressStore;
pub use reviews::ReviewStore;

/// The full storage surface the services are wired against.
pub trait Store:
    IdentityStore
    + AccessStore
    + CatalogStore
    + ProgressStore
    + AssessmentStore
    + CommerceStore
    + PayoutStore
    + ReviewStore
    + AuditStore
    + MediaStore
{
}

impl<T> Store for T where
    T: IdentityStore
        + AccessStore
        + CatalogStore
        + ProgressStore
        + AssessmentStore
        + CommerceStore
        + PayoutStore
        + ReviewStore
        + AuditStore
        + MediaStore
{
}
