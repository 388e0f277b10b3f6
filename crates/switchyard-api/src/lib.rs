// switchyard-api: async session clients for the two managed switch families.
//
// The Vimins family speaks a structured CGI/JSON command protocol; the
// Sodola family only exposes an HTML web UI that we scrape. Both are
// driven through the same `DeviceSessionClient` trait so orchestration
// code never branches on vendor.

pub mod client;
pub mod error;
pub mod models;
pub mod session;
pub mod sodola;
pub mod transport;
pub mod vimins;

pub use client::DeviceSessionClient;
pub use error::Error;
pub use sodola::SodolaClient;
pub use vimins::ViminsClient;
