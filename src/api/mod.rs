//! Document submission API: payload types, transport, and the client.

mod client;
mod document;
mod transport;

pub use client::CrptClient;
pub use document::{Document, DocumentOptions, SubmissionRequest};
pub use transport::{HttpReply, HttpTransport, Transport};
