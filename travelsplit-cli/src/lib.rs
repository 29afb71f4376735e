pub mod app;
pub mod render;
pub mod scenario;
pub mod telemetry;
