//! WeNe Identity — operator authentication and admin invites (spec §4.G):
//! master/demo/invite token precedence, invite lifecycle, and per-event
//! ownership scoping for admin routes.

pub mod auth;
pub mod config;
pub mod error;
pub mod invites;
pub mod ownership;

pub use auth::IdentityService;
pub use config::IdentityConfig;
pub use error::{IdentityError, IdentityResult};
pub use invites::InviteService;
pub use ownership::OwnershipGuard;
