pub mod branch;
pub mod error;
pub mod fragmenter;
pub mod source;

pub use branch::*;
pub use error::*;
pub use fragmenter::*;
pub use source::*;
