mod authority;
mod principal;
mod role;

pub use authority::*;
pub use principal::*;
pub use role::*;
