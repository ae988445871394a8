// Domain layer: models and ports (interfaces) shared by the core and the adapters.

pub mod model;
pub mod ports;
