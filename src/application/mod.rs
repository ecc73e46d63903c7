pub mod accounts;
pub mod passes;
pub mod reports;
pub mod scheduling;

pub use accounts::*;
pub use passes::*;
pub use reports::*;
pub use scheduling::*;
