pub mod error;

pub use error::EnhanceError;
