/*!
    Shared types for the rawmill media engine.

    This crate defines the vocabulary of the engine — the types that cross
    crate boundaries. It has no dependency on FFmpeg, making it lightweight
    and enabling consumers to depend on it without pulling in FFmpeg
    bindings.

    # Core Types

    - [`Rational`] - Rational numbers for frame rates and time bases
    - [`Session`] - Shared format parameters for decoders, encoders and mixers
    - [`Error`] and [`Result`] - Common error types

    # Fixed Formats

    The engine decodes to, and encodes from, one fixed intermediate format:
    packed UYVY422 video and interleaved 16-bit stereo PCM at 44100 Hz.
    See the [`format`] module for the constants.

    # Logging

    A single process-wide log callback with ordered severity filtering,
    see [`log`]. Last setter wins; it is not multi-tenant safe.
*/

pub mod format;
pub mod log;

mod error;
mod rational;
mod session;

pub use error::{Error, Result};
pub use log::LogLevel;
pub use rational::Rational;
pub use session::Session;
