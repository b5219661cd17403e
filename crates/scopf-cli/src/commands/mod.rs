pub mod inspect;
pub mod solve;
pub mod util;
pub mod validate;
