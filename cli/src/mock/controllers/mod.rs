//! # Resource Controllers
//!
//! File: cli/src/mock/controllers/mod.rs
//! Author: Christi Mahu
//!
//! Request handlers grouped by resource. Each controller owns clones of the
//! shared handles it needs and registers its routes on a `Router`. Business
//! failures (unknown id, refused transition, missing fixture) are answered as
//! responses with a status code; no handler returns an error.
//!
pub mod container;
pub mod image;
pub mod payloads;
pub mod session;

pub use container::ContainerController;
pub use image::ImageController;
pub use session::SessionController;
