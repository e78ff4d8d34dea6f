//! Infrastructure layer for the client application.
//!
//! Contains OS-facing adapters: the Linux uinput virtual device, the null
//! cursor prober, and the TLS-capable TCP `Session` to the Synergy server.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `synergy_core`, but MUST NOT be imported by the `application` layer.

pub mod cursor;
pub mod network;
pub mod virtual_device;
