// Domain layer: content models and ports (interfaces). No rendering logic here.

pub mod model;
pub mod ports;
