//! DNS responder that answers address queries from an HTTP lookup service.
//!
//! Each datagram is decoded, every question name is looked up through a
//! [`Resolve`] implementation, and an answer record pointing back at the
//! question is synthesized for every address returned.

pub mod config;
pub mod dns;
pub mod error;
pub mod packet;
pub mod resolver;
pub mod server;

pub use crate::config::{CliOverrides, Config};
pub use crate::dns::{Answer, Header, QueryType, Question, Request, Resolutions, Response};
pub use crate::error::{ConfigError, DecodeError, EncodeError, Error, ResolveError, Result};
pub use crate::resolver::{parse_addresses, resolve_all, HttpResolver, Resolve};
pub use crate::server::{handle_datagram, Server};
