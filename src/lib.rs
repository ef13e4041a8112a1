#![deny(
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    rust_2018_idioms,
    unsafe_code
)]
#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    clippy::explicit_iter_loop,
    clippy::use_self,
    clippy::clone_on_ref_ptr
)]
pub mod cluster;
pub mod fixture;
pub mod metadata;
pub mod protocol;
pub mod utils;

pub type ProtocolError = protocol::error::Error;
