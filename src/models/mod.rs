//! Data models for the studio REST surface and the vendor wire format.
//!
//! - `api`: inbound request/response bodies used by the browser client
//! - `imagefx`: reverse-engineered upstream ImageFX payloads
//! - `mapping`: model catalog and aspect-ratio tables

// Author: kelexine (https://github.com/kelexine)

pub mod api;
pub mod imagefx;
pub mod mapping;

pub use api::{AddReferenceRequest, GenerateRequest, ImprovePromptRequest, SettingsUpdate};
pub use mapping::{map_model, AspectRatio, ModelKind};
