// nexview-api: Async Rust client for the nexview telemetry server

pub mod client;
pub mod error;
pub mod frame;
pub mod models;
pub mod tls;
pub mod transport;
pub mod weather;
pub mod websocket;

pub use client::ApiClient;
pub use error::Error;
pub use frame::Frame;
pub use models::SocketTicket;
pub use transport::{TlsMode, TransportConfig};
pub use weather::{WeatherClient, WeatherInfo};
pub use websocket::{LinkEvent, StreamLink};
