//! Hand-off of sealed batches: an external archive command followed by a
//! vault import call.

mod client;
mod command;
mod dispatch;
mod error;
mod tar;

pub use client::{ImportCommand, ReqwestVaultClient, VaultApi, parse_base_url};
pub use command::Command;
pub use dispatch::{ArchiveDispatcher, VaultDispatcher};
pub use error::{Error, Result};
pub use tar::{Archiver, TarCommand};
