//! Sends one sample "new convention" notification through the configured
//! multiplexer (log channel only unless webhook env vars are set).

use convention_tracker::{ConventionRecord, Notification, Notifier, NotifierMux, Permission};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();
    let mux = NotifierMux::from_env();

    if mux.request_permission().await == Permission::Denied {
        println!("notify-demo: notifications disabled");
        return;
    }

    let sample = ConventionRecord::new(
        "Asylum 30",
        Some("Birmingham, UK".into()),
        "12 Jan 2026",
        "https://www.starfuryconventions.co.uk",
        "Starfury Conventions",
    );
    if let Err(e) = mux.notify(&Notification::new_convention(&sample)).await {
        tracing::warn!(error = ?e, "demo notification failed");
    }

    println!("notify-demo done ({:?})", mux.channel_names());
}
