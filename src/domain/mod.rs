// Domain layer: mapping rows, label sets and the ports the pipelines depend on.

pub mod model;
pub mod ports;
