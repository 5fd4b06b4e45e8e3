//! Account management: profile self-service, admin reads and direct
//! membership-tier mutation.

mod service;

pub mod handlers;

pub use service::{AccountService, UpdateProfile, UserResponse};
pub(crate) use service::apply_vip_upgrade;
