//! Request middleware: trusted-header identity extraction and path
//! authorization.
//!
//! Layer order matters: [`identity_middleware`] must run before
//! [`authz_middleware`] so the principal is in the request extensions.

mod authz;
mod identity;

pub use authz::{AuthzResponse, authorize_request, authz_middleware};
pub use identity::{AuthenticatedPrincipal, identity_middleware, principal_from_headers};
