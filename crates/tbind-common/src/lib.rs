//! Shared types for the temporary-binding toolchain: byte spans, the line
//! index used for diagnostics, the token vocabulary and lexer errors.

pub mod error;
pub mod span;
pub mod token;
