mod pool;
mod service;

pub use pool::distribute_pool;
pub use service::PayoutService;
