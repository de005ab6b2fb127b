//! Skybox CLI library.
//!
//! Exposes the session orchestrators and collaborator wiring so integration
//! tests can assemble them from fakes.

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod session;
pub mod wiring;
