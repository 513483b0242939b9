pub mod classify;
pub mod indicators;
pub mod returns;
pub mod risk;


pub use classify::*;
pub use indicators::*;
pub use returns::*;
pub use risk::*;
