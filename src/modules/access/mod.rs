mod service;

pub use service::AccessService;
