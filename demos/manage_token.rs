//! Token file management example for HyperFlex clusters.
//!
//! This example demonstrates:
//! - Loading configuration and credentials from environment variables
//! - Ensuring a valid token file exists, creating or renewing it
//! - Reading token metadata without contacting the cluster
//!
//! # Usage
//!
//! ```bash
//! export HX_TARGET="hx-cluster.example.com"
//! export HX_USERNAME="admin"
//! export HX_PASSWORD="your-password"
//! # optional
//! export HX_TOKEN_FILE="hx_api_token.xml"
//! export HX_INSECURE_SKIP_VERIFY="true"
//! ```
//!
//! Then run:
//! ```bash
//! RUST_LOG=hyperflex_token_integration=debug cargo run --example manage_token
//! ```

use hyperflex_token_integration::{
    Credentials, HxTokenClient, HxTokenConfig, OverwritePolicy, Projection,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    println!("=== HyperFlex Token File Example ===\n");

    let config = HxTokenConfig::from_env()?;
    let credentials = Credentials::from_env()?;
    let path = std::env::var("HX_TOKEN_FILE").unwrap_or_else(|_| "hx_api_token.xml".to_string());

    println!("1. Cluster API: {}", config.base_url);
    println!("   Token file:  {}\n", path);

    let client = HxTokenClient::new(config, credentials)?;

    println!("2. Ensuring a valid token...");
    match client
        .ensure_token(&path, Projection::AccessToken, OverwritePolicy::Overwrite)
        .await?
    {
        Some(_) => println!("   ✓ Token is valid\n"),
        None => println!("   ✗ Token is stale and was not renewed\n"),
    }

    println!("3. Token metadata:");
    for projection in [
        Projection::TokenType,
        Projection::HumanReadableTime,
        Projection::UnixTimestampTime,
        Projection::SourceModule,
    ] {
        if let Some(value) = client
            .ensure_token(&path, projection, OverwritePolicy::Preserve)
            .await?
        {
            println!("   {:<20} {}", projection.as_str(), value.as_str().unwrap_or_default());
        }
    }

    println!("\n=== Example completed successfully ===");
    Ok(())
}
