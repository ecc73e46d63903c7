pub mod account;
pub mod class;
pub mod ids;
pub mod pass;

pub use account::*;
pub use class::*;
pub use ids::*;
pub use pass::*;
