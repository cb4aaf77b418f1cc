//! Ambient demo driver: wires the core (`Processor`/`Builder`) to a real
//! `tokio::net::TcpStream` so the capability set is runnable out of the
//! box. None of this is part of the protocol core itself — it is the "host
//! application" spec.md refers to throughout.

pub mod connection;
