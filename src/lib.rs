#![deny(missing_docs)]
#![deny(missing_copy_implementations)]
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
#![deny(unused_import_braces)]
#![deny(unused_qualifications)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

//! This crate implements a client for the Creality WiFi Box, the network
//! adapter that puts Creality 3D printers on the LAN.
//!
//! The box speaks a flat command-query interface over plain HTTP GET. The
//! status query is decoded into a strongly typed [BoxInfo]; the print control
//! commands report success through a top-level `error` field.

pub mod box_info;
pub mod client;
pub mod command;
pub mod config;
pub mod decode;
pub mod error;

pub use box_info::BoxInfo;
pub use client::{check_command_response, BoxClient, ScopedClient, DEFAULT_TIMEOUT};
pub use command::Command;
pub use config::Config;
pub use decode::DecodeError;
pub use error::{ConnectionError, Error, Result};
