pub mod coercion;
pub mod error;
pub mod normalizer;
pub mod quality_gate;
