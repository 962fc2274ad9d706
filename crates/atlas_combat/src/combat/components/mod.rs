//! Combat components

pub mod actor;
pub mod combo;
pub mod health;
pub mod parry;
pub mod tags;
pub mod vulnerability;


// Re-export all components
pub use actor::*;
pub use combo::*;
pub use health::*;
pub use parry::*;
pub use tags::*;
pub use vulnerability::*;
