pub mod catalog;
pub mod descriptor;
pub mod locator;
pub mod response;
pub mod scale;
pub mod structure;

pub use catalog::*;
pub use descriptor::*;
pub use locator::*;
pub use response::*;
pub use scale::*;
pub use structure::*;
