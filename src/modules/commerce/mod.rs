mod promo;
mod service;

pub use promo::evaluate_promo;
pub use service::CommerceService;
