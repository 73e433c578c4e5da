pub mod engine;
pub mod spec;

pub use engine::{ElementLocator, LocatedElement};
pub use spec::{LocatorSpec, SemanticRole, Strategy, StrategySpec, TargetKind};
