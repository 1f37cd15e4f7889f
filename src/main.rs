use std::sync::Arc;

use anyhow::Context;

use booking_assist::api::HttpBookingClient;
use booking_assist::config::WizardConfig;
use booking_assist::flow::Wizard;
use booking_assist::ui::CliUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the conversation.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = WizardConfig::from_env().context("loading configuration")?;

    eprintln!("📅 Booking Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {}", config.api.base_url);
    eprintln!("   Timeout: {:?}", config.api.timeout);
    eprintln!("   Type an option number and press Enter. /restart starts over, /quit exits.\n");

    let api = Arc::new(HttpBookingClient::new(&config.api));
    let ui = Arc::new(CliUi::new());
    let mut wizard = Wizard::new(api, ui.clone(), config);

    wizard.start().await?;

    while let Some(action) = ui.next_action().await.context("reading input")? {
        if let Err(e) = wizard.select(action).await {
            tracing::warn!(error = %e, "Choice ignored");
        }
    }

    tracing::info!(flow_id = %wizard.session().flow_id(), "Session ended");
    Ok(())
}
