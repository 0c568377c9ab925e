//! # API Routes
//!
//! Each module exposes a `router()` returning `Router<AppState>`; they are
//! merged in [`crate::app`].

pub mod index;
pub mod scoring;
