//! Top-level facade crate for mlprobe.
//!
//! Re-exports the core decorator engine and the axum integration so users can depend on a single crate.

pub mod core {
    pub use mlprobe_core::*;
}

pub mod axum {
    pub use mlprobe_axum::*;
}
