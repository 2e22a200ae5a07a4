//! Credentials, session tokens and the ownership policy guarding mutations.

pub mod error;
pub mod password;
pub mod policy;
pub mod token;

pub use error::{AuthError, AuthResult};
pub use password::{HashCost, Passwords};
pub use policy::{Decision, Identity};
pub use token::{Claims, TokenService};
