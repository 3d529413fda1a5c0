pub mod item;
pub mod table;

pub use item::*;
pub use table::*;
