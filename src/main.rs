//! triage - Prints the grouped triage view from the backend

use anyhow::{bail, Context, Result};
use triage::app::{PageStatus, TriageEngine};
use triage::config::Settings;
use triage::providers::backend::HttpTriageApi;
use triage::services::PhaseKind;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let settings = Settings::load_or_default().context("failed to load settings")?;
    tracing::info!(backend = %settings.api.base_url, bucket = %settings.view.bucket, "Starting triage");

    let api = HttpTriageApi::new(&settings.api.base_url, settings.api.timeout())
        .context("failed to create backend client")?;
    let mut engine = TriageEngine::new(api, settings);

    engine
        .load_page()
        .await
        .context("failed to load the triage view")?;

    match &engine.page().status {
        PageStatus::Ready => {}
        PageStatus::AuthRequired => bail!("not signed in; connect an account in the web app first"),
        other => bail!("page did not load: {:?}", other),
    }

    if let Some(identity) = &engine.page().identity {
        println!("Signed in as {}", identity.email);
    }
    println!(
        "{} view: {} of {} emails",
        engine.page().bucket,
        engine.items().len(),
        engine.page().total
    );

    for group in engine.groups() {
        println!("\n{} ({})", group.key.label(), group.len());
        for view in &group.items {
            let item = &view.item;
            let marker = match view.phase {
                PhaseKind::Stable if view.has_pending_edit => "*",
                PhaseKind::Stable => " ",
                PhaseKind::InFlight => "~",
                PhaseKind::AnimatingOut => "-",
            };
            println!(
                "  {} {:>6}  {:<32}  {}",
                marker,
                item.confidence
                    .map(|c| format!("{:.2}", c))
                    .unwrap_or_else(|| "-".to_string()),
                item.from_name
                    .as_deref()
                    .or(item.from_address.as_deref())
                    .unwrap_or("(unknown sender)"),
                item.subject.as_deref().unwrap_or("(no subject)")
            );
        }
    }

    Ok(())
}
