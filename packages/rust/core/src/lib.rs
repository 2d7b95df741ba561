//! Core pipeline orchestration and domain logic for controlkb.
//!
//! This crate ties scanning, import resolution, symbol extraction and
//! request-key harvesting into the knowledge-base build, and serves the
//! read-only views downstream tools consume.

pub mod assembler;
pub mod context;
pub mod knowledge_base;
pub mod pipeline;
