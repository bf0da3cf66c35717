/*
 * Responsibility
 * - tokio runtime start
 * - app::run() call (no logic here)
 */
use anyhow::Result;

mod app;
mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    app::run().await
}
