//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `stride_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("stride_core version={}", stride_core::core_version());
}
