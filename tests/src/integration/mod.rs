//! Cross-subsystem scenarios driven through the wired runtime.

pub mod fixtures;

mod concurrency;
mod flows;
mod notifications;
