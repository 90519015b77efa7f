//! Admin authentication: bearer-token storage and session handling.
//!
//! - `login` posts credentials to `/auth/login` and stores the returned JWT
//! - `restore_session` rebuilds the signed-in user from a stored JWT
//! - Any 401 seen by the request layer clears the stored token

mod credentials;
mod session;

pub use credentials::{CredentialError, CredentialProvider, FileCredentials, MemoryCredentials};
pub use session::{login, logout, restore_session, AdminUser, AuthError};
