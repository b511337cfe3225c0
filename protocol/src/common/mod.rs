pub mod account;
pub mod key;

pub use account::*;
pub use key::*;
