//! Read device information

use dahua::Gateway;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> dahua::Result<()> {
    // Initialize logging (RUST_LOG=dahua=debug for request traces)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let host = std::env::var("DAHUA_HOST").unwrap_or_else(|_| "192.168.1.108".to_string());
    let user = std::env::var("DAHUA_USER").unwrap_or_else(|_| "admin".to_string());
    let password = std::env::var("DAHUA_PASSWORD").unwrap_or_default();

    println!("Connecting to {}...", host);

    let gateway = Gateway::builder(host)
        .with_credentials(user, password)
        .build()?;

    let info = gateway.device_info().await?;
    println!("✓ Device: {}", info);

    if let Some(name) = &info.machine_name {
        println!("  Name:     {}", name);
    }
    if let Some(date) = info.build_date {
        println!("  Built:    {}", date);
    }
    if let Some(vendor) = &info.vendor {
        println!("  Vendor:   {}", vendor);
    }

    Ok(())
}
