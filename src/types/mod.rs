//! Data types shared by the windowing engine.

mod column;
mod record;
mod row;

pub use column::*;
pub use record::*;
pub use row::*;
