mod service;

pub use service::MediaService;
