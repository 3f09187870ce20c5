// Domain layer: records and the seams the processor talks through.

pub mod model;
pub mod ports;
