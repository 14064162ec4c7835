mod handshake;
mod suite;

pub use handshake::run_handshake;
pub use suite::run_smoke_suite;
