pub mod config;
pub mod error;
pub mod sanitize;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::*;
pub use sanitize::*;
pub use traits::*;
pub use types::*;
