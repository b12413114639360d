use crate::{config::Config, gateways};
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use geopick_core::{
    entities::*,
    usecases::{AddressState, LocationFix, SearchEvent},
    util::validate::MIN_QUERY_LEN,
    Error,
};
use std::{path::PathBuf, time::Duration};

/// How long to wait for the user to answer a permission request.
const PERMISSION_PROMPT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Parser)]
#[command(name = "geopick", version, about = "Pick a location and resolve its address")]
pub struct Args {
    /// Configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve the current device position
    Locate,
    /// Resolve the address of a coordinate
    Reverse {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lng: f64,
    },
    /// List the places that match a query
    Search { query: String },
    /// Search for a place, pick one of the results and resolve its address
    Pick {
        query: String,
        /// Position of the place within the search results
        #[arg(short, long, default_value_t = 0)]
        index: usize,
    },
}

pub async fn run(args: Args) -> Result<()> {
    let Args { config, command } = args;
    let cfg = Config::try_load_from_file_or_default(config)?;
    let picker = gateways::location_picker(&cfg)?;
    match command {
        Command::Locate => locate(&picker).await,
        Command::Reverse { lat, lng } => {
            let pos = Coordinate::try_from_lat_lng_deg(lat, lng)
                .ok_or_else(|| anyhow!("Invalid coordinate: {lat},{lng}"))?;
            picker.move_to(pos).await?;
            print_pick(&picker);
            Ok(())
        }
        Command::Search { query } => {
            for (i, p) in search(&picker, &query).await?.iter().enumerate() {
                println!("[{i}] {} ({}) {}", p.primary_text, p.secondary_text, p.id);
            }
            Ok(())
        }
        Command::Pick { query, index } => {
            let predictions = search(&picker, &query).await?;
            let prediction = predictions.get(index).ok_or_else(|| {
                anyhow!("No place at index {index}, found {}", predictions.len())
            })?;
            log::info!("Picking {} ({})", prediction.primary_text, prediction.id);
            picker.select_prediction(&prediction.id).await?;
            picker
                .lookup()
                .subscribe()
                .wait_for(AddressState::is_done)
                .await?;
            print_pick(&picker);
            Ok(())
        }
    }
}

async fn locate(picker: &gateways::Picker) -> Result<()> {
    let mut fix = picker.locate_me().await;
    if fix == LocationFix::Absent(Error::PermissionDenied) {
        log::info!("Waiting for the location permission");
        let mut fixes = picker.resolver().subscribe();
        let answered = tokio::time::timeout(
            PERMISSION_PROMPT_TIMEOUT,
            fixes.wait_for(|fix| *fix != LocationFix::Pending),
        )
        .await;
        if let Ok(Ok(answer)) = answered {
            fix = answer.clone();
        }
    }
    match fix {
        LocationFix::Present(pos) => {
            println!("{pos}");
            Ok(())
        }
        LocationFix::Absent(err) => Err(err.into()),
        LocationFix::Unknown | LocationFix::Pending => Err(anyhow!("Unknown device position")),
    }
}

async fn search(picker: &gateways::Picker, query: &str) -> Result<Vec<PlacePrediction>> {
    let session = picker.search();
    let mut events = session.events();
    let Some(task) = session.on_query_changed(query) else {
        return Err(anyhow!(
            "The query must have at least {MIN_QUERY_LEN} characters"
        ));
    };
    task.await?;
    if let Ok(SearchEvent::Error(err)) = events.try_recv() {
        return Err(err.into());
    }
    Ok(session.state().predictions)
}

fn print_pick(picker: &gateways::Picker) {
    if let AddressState::Error(err) = picker.lookup().state() {
        log::warn!("{err}");
    }
    if let Some(Location { pos, .. }) = picker.picked_location() {
        println!("{pos}");
    }
    println!("{}", picker.address_line());
}
