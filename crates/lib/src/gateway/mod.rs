//! Gateway: the public HTTP surface and the process run loop.
//!
//! Single port, one route: `GET /{file_id}` answers with a 301 to the file host.

mod server;

pub use server::{redirect_router, run_relay, run_relay_until, RedirectState};
