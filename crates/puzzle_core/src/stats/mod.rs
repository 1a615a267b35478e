//! Pure statistics over attempt windows.

pub mod trimmed_mean;
