pub mod cache_controller;
pub mod refresh_controller;

pub use cache_controller::CacheController;
pub use refresh_controller::RefreshJob;
