use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use yield_lead::config::FetchConfig;
use yield_lead::fetchers::google::GoogleMapsClient;
use yield_lead::{FetchEvent, Session};

mod args;
use args::Args;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    // The CLI key wins, then the environment, then the config file
    let mut config = match &args.config {
        Some(path) => match FetchConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                ::log::error!("Failed to load config from {}: {}", path.display(), e);
                return;
            }
        },
        None => FetchConfig::new(""),
    };
    if let Some(key) = args
        .api_key
        .clone()
        .or_else(|| std::env::var("GOOGLE_MAPS_API_KEY").ok())
    {
        config.api_key = key;
    }

    let client = match GoogleMapsClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            ::log::error!("Failed to create places client: {}", e);
            return;
        }
    };

    let mut session =
        Session::new(Arc::new(client)).with_page_delay(Duration::from_secs(config.page_delay_secs));

    if let Some(file) = &args.file {
        let seeded = session.load_existing_file(file);
        println!("Loaded {} existing records from {}", seeded, file.display());
    }

    let (tx, mut rx) = mpsc::channel(100);
    session.set_event_sink(tx);

    // One fetch worker; this task consumes its progress stream
    let query = args.query.clone();
    let worker = tokio::spawn(async move {
        run_rounds(&mut session, &query, args.count, args.rounds.max(1)).await;
        session.clear_event_sink();
        session
    });

    while let Some(event) = rx.recv().await {
        match event {
            FetchEvent::Admitted { record, fetched } => {
                println!(
                    "{:>4}  {} | {} | {} | {}",
                    fetched, record.name, record.address, record.phone, record.maps_link
                );
            }
            FetchEvent::Warning(message) => {
                println!("warning: {}", message);
            }
        }
    }

    let session = match worker.await {
        Ok(session) => session,
        Err(e) => {
            ::log::error!("Fetch worker panicked: {}", e);
            return;
        }
    };

    println!("Fetched {} new records", session.records().len());
    if session.records().is_empty() {
        return;
    }
    match session.merge_to_file() {
        Ok(Some(path)) => {
            println!("Appended new records to {}", path.display());
        }
        Ok(None) => {
            ::log::info!("No dataset file loaded; fetched records were not persisted");
        }
        Err(e) => {
            ::log::error!("Failed to append to dataset: {}", e);
        }
    }
}

/// Runs the initial fetch plus any continue rounds on the worker task
async fn run_rounds(session: &mut Session, query: &str, count: usize, rounds: usize) {
    let mut summary = match session.start(query, count).await {
        Ok(summary) => summary,
        Err(e) => {
            ::log::error!("Fetch failed: {}", e);
            return;
        }
    };
    ::log::info!(
        "Round 1 fetched {} new records ({} total)",
        summary.new_records,
        summary.total_records
    );

    for round in 2..=rounds {
        if !summary.more_available {
            ::log::info!("Source exhausted, stopping after {} rounds", round - 1);
            break;
        }
        summary = match session.continue_fetch().await {
            Ok(summary) => summary,
            Err(e) => {
                ::log::error!("Continue failed: {}", e);
                break;
            }
        };
        ::log::info!(
            "Round {} fetched {} new records ({} total)",
            round,
            summary.new_records,
            summary.total_records
        );
    }
}
