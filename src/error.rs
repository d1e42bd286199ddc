use std::io;
use thiserror::Error;

/// A datagram that does not follow the DNS wire grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("end of buffer at position {0}")]
    EndOfBuffer(usize),

    #[error("label of {0} bytes exceeds 63 bytes")]
    LabelTooLong(u8),

    #[error("encoded name exceeds 255 bytes")]
    NameTooLong,

    #[error("address record with {0} bytes of data")]
    UnexpectedDataLength(u16),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("name pointer offset {0} does not fit in 14 bits")]
    PointerOutOfRange(usize),

    #[error("{0} records do not fit in a 16-bit section count")]
    TooManyRecords(usize),
}

/// Failure to resolve a single name. Never fatal for the request.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("lookup request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("lookup endpoint answered with status {0}")]
    Status(u16),

    #[error("invalid IPv4 address in lookup result: {0:?}")]
    InvalidAddress(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    FileRead(String, String),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid bind address {0:?}")]
    InvalidAddress(String),

    #[error("configuration validation error: {0}")]
    Validation(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("malformed packet: {0}")]
    Decode(#[from] DecodeError),

    #[error("cannot encode response: {0}")]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("socket error: {0}")]
    Channel(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
