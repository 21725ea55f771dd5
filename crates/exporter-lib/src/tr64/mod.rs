//! TR-064 transport
//!
//! Reads the device description and SCPD documents to build the catalog,
//! and invokes actions as SOAP 1.1 requests over HTTP.

mod client;
mod description;
mod soap;

pub use client::{Tr64Client, Tr64Config};
pub use description::{parse_description, parse_scpd, ServiceEntry};
pub use soap::{build_envelope, parse_response};
