//! Pure domain logic for the parallax batch renderer.
//!
//! Effects and their catalog, render parameters, the [`Job`](job::Job)
//! value, output naming and the directory-backed
//! [`JobSource`](job_source::JobSource). Nothing here touches an async
//! runtime or a renderer.

pub mod effect;
pub mod error;
pub mod job;
pub mod job_source;
pub mod naming;
pub mod params;
pub mod selection;
pub mod types;
