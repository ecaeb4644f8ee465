//! Repository implementations

pub mod fortunes;

pub use fortunes::FortuneRepo;
