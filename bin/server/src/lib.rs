//! budget-chat webhook server.
//!
//! This crate wires the dialog orchestrator to its production collaborators:
//! the WhatsApp Cloud API, an OpenAI-compatible model provider, and
//! PostgreSQL-backed session and ledger stores.

pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod webhook;
pub mod whatsapp;
