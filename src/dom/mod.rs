pub mod element;
pub mod inspector;

pub use element::DomElement;
pub use inspector::{DomInspector, PageSnapshot};
