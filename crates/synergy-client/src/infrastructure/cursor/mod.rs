//! Infrastructure adapters implementing the application layer's
//! `CursorContext` capability trait.
//!
//! See `synergy_client::application::cursor` for why the shipped Linux
//! implementation is a null object rather than a real compositor probe.

pub mod mock;
pub mod null;

pub use mock::MockCursorContext;
pub use null::NullCursorContext;
