//! Request authorization and anti-forgery primitives.

pub mod capability;
pub mod nonce;
