// Pipeline processing: one module per cleaning stage, plus the quality gate

pub mod coerce;
pub mod dedupe;
pub mod derive;
pub mod filter;
pub mod normalize;
pub mod quality_gate;
pub mod sanitize;
