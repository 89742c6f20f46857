// Domain layer: core models, ports (interfaces) and the pure scheduling services.
// No I/O lives here; adapters implement the ports.

pub mod model;
pub mod ports;

pub mod services;
