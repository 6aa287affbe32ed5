pub mod appointment;
pub mod enums;
pub mod pet;

pub use appointment::*;
pub use enums::*;
pub use pet::*;
