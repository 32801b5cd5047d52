//! Overlay and lighting control example

use std::time::Duration;

use dahua::{Gateway, InfraredMode, Operation, Outcome, ProfileMode};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> dahua::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let host = std::env::var("DAHUA_HOST").unwrap_or_else(|_| "192.168.1.108".to_string());
    let user = std::env::var("DAHUA_USER").unwrap_or_else(|_| "admin".to_string());
    let password = std::env::var("DAHUA_PASSWORD").unwrap_or_default();
    let text = std::env::var("OVERLAY_TEXT").unwrap_or_else(|_| "Front Porch".to_string());

    let gateway = Gateway::builder(host)
        .with_credentials(user, password)
        .with_timeout(Duration::from_secs(10))
        .build()?;

    let operations = [
        Operation::set_custom_overlay(0, 0, &[text.as_str(), ""]),
        Operation::enable_custom_overlay(0, 0, true),
        Operation::set_video_profile_mode(ProfileMode::Day),
        Operation::set_infrared_mode(InfraredMode::Auto, 100),
    ];

    for operation in &operations {
        match gateway.execute(operation).await? {
            Outcome::Success(_) => println!("✓ {}", operation),
            Outcome::VendorError { code, message } => {
                println!("✗ {}: device said {} ({})", operation, message, code)
            }
            Outcome::TransportError(kind) => println!("✗ {}: {}", operation, kind),
            Outcome::AuthError => {
                println!("✗ {}: credentials rejected", operation);
                break;
            }
        }
    }

    let outcome = gateway.execute(&Operation::get_config("VideoWidget")).await?;
    if let Some(reply) = outcome.reply() {
        for (key, value) in reply.iter().filter(|(key, _)| key.contains("UserDefinedTitle[0]")) {
            println!("  {} = {}", key, value);
        }
    }

    Ok(())
}
