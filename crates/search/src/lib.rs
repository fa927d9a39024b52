pub mod autocomplete;
pub mod keywords;

pub use autocomplete::*;
pub use keywords::*;
