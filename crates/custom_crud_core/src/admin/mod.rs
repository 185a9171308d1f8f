//! Host-agnostic admin surface.
//!
//! # Responsibility
//! - Parse admin requests into actions and outcomes.
//! - Render the listing/edit page.
//! - Produce transport-neutral responses (`AdminResponse`).
//!
//! # Invariants
//! - Every entry point checks the required capability before touching storage.
//! - Authorized save and delete always answer with a redirect to the listing page.

pub mod action;
pub mod controller;
pub mod notice;
pub mod request;
pub mod routes;
pub mod view;
