//! The VIP upgrade-request workflow: a user files a request, an
//! administrator approves or rejects it, approval upgrades the account.

mod service;

pub mod handlers;

pub use service::{CreateRequestPayload, ProcessDecision, RequestService, VipRequestResponse};
