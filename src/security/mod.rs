//! Admin access control: the self-rotating credential and the session gate.

pub mod credentials;
pub mod session;

pub use credentials::{CredentialManager, RotationPolicy};
pub use session::{DenyReason, SessionGate};
