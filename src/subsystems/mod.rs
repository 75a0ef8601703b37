pub mod comms;
pub mod relay;
pub mod runtime;
