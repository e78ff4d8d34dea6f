//! synergy-client library entry point.
//!
//! Re-exports the application and infrastructure module trees so that
//! integration tests in `tests/` and the binary entry point in `main.rs`
//! share the same module tree.
//!
//! # What does synergy-client do?
//!
//! This client impersonates a Synergy/Barrier screen: it connects to a
//! Synergy server as a TCP (optionally TLS or mTLS) control-channel client,
//! completes the `Synergy`-prefixed handshake, and from then on translates
//! every `DKDN`/`DKUP`/`DMMV`/`DMDN`/… message the server sends into a real
//! kernel input event via a Linux `uinput` virtual keyboard/mouse. It is
//! built for Wayland compositors that have no XTest-equivalent synthetic
//! input API and no remote-input portal: uinput injection at the kernel
//! level works regardless of which compositor is running.
//!
//! 1. Loads [`application::config::ClientConfig`] from a TOML file (or
//!    built-in defaults).
//! 2. Opens a [`infrastructure::network::Session`] to the configured
//!    server address, negotiating TLS/mTLS per the transport config.
//! 3. Completes the handshake (`"Synergy"` greeting in, `HelloBack` out).
//! 4. Feeds every subsequent decoded message into an
//!    [`application::dispatch::Dispatcher`], which emits kernel events
//!    through a [`application::virtual_device::VirtualDevice`].

/// Application layer: use cases for the client (dispatch, config, the
/// `VirtualDevice`/`CursorContext` capability traits).
pub mod application;

/// Infrastructure layer: the uinput device, null cursor prober, and the
/// TLS-capable network session.
pub mod infrastructure;
