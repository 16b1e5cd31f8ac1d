//! Common types shared across the SDK

pub mod types;
