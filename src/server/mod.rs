pub mod api;

use anyhow::Result;

pub use api::serve_listener;

pub async fn start(port: u16) -> Result<()> {
    api::serve(port).await
}
