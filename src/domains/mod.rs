//! Domains module containing business logic organized by bounded contexts.
//!
//! The server has a single domain: tools. Resources and prompts are not
//! offered.

pub mod tools;
