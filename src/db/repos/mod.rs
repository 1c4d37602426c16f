mod authorities;
mod principals;

pub use authorities::AuthorityRepo;
pub use principals::PrincipalRepo;
