//! Ports (trait boundaries) between the learning loop and its observers.

pub mod observer;

pub use observer::Observer;
