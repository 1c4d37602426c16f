mod authorities;
mod principals;
mod seed;

pub use authorities::SqliteAuthorityRepo;
pub use principals::SqlitePrincipalRepo;
pub use seed::{SeedStats, import_seed};
