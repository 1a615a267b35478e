//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into the ingestion use-case.
//! - Keep callers decoupled from storage and transport details.

pub mod best_record_service;
pub mod ingest_service;
