//! Offline replay of recorded spin logs.

pub mod runner;
