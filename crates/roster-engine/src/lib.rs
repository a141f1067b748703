#![forbid(unsafe_code)]

pub mod atomic;
pub mod settings;
pub mod store;

pub use settings::Settings;
pub use store::Store;
