pub mod types;

pub use types::{PublishError, Result};
