//! Use-case services on top of the repositories.

pub mod entry_service;
