//! Image Cropper — drag-select a region of any displayed image, extract it
//! at native resolution and relay it to an analysis consumer.
//!
//! Domains:
//!   - geometry  — viewport → local → native coordinate mapping
//!   - session   — one drag gesture as a state machine
//!   - binder    — makes page images selectable, routes gesture events
//!   - extract   — crop native pixels + PNG encode
//!   - relay     — persist record, live notify, open consumer
//!   - consumer  — render + upload the delivered image
//!   - host      — capability traits the embedding page implements
//!
//! The CLI shell lives in cli.rs; no business logic there.

pub mod binder;
mod cli;
pub mod config;
pub mod consumer;
pub mod dataurl;
pub mod extract;
pub mod geometry;
pub mod host;
pub mod relay;
pub mod session;

pub use cli::run;
