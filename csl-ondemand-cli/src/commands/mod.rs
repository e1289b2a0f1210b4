//! CLI command implementations.

pub mod bundle;
pub mod index;
pub mod init;
pub mod lookup;
pub mod serve;
