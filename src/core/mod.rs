pub mod browser;
pub mod config;

pub use browser::{AttachMode, BrowserTrait};
pub use config::Config;
