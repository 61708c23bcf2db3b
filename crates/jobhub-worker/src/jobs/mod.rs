//! Built-in job handler implementations.

pub mod simulated;

pub use simulated::SimulatedJobHandler;
