pub mod error;
pub mod table;

pub use error::*;
pub use table::*;
