#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for Chattanooga council district lookups.
//!
//! Looks up the council district, nearest polling place, council member,
//! and ballot candidates for a street address, and provides the
//! supporting tools: address validation and suggestions, district and
//! candidate listings, a voter registration check, and conversion of the
//! city's redistricting CSV into the boundary file the lookups read.
//!
//! Reference files are read from `--data-dir` (default `data/`).

use std::path::PathBuf;
use std::sync::Arc;

use chattanooga_vote_district_models::{DistrictInfo, ServiceArea, normalize_district_id};
use chattanooga_vote_geocoder::Geocoder;
use chattanooga_vote_geocoder::address::check_address;
use chattanooga_vote_geocoder::service_registry::service_from_env;
use chattanooga_vote_lookup::registration::check_registration;
use chattanooga_vote_lookup::{DistrictLookup, ELECTION_COMMISSION_CONTACT, LookupOutcome};
use chattanooga_vote_reference::candidates::candidates_2025;
use chattanooga_vote_reference::{REFERENCE_TTL, ReferenceData, ReferencePaths, ReferenceStore};
use clap::{Parser, Subcommand};

// ---------------------------------------------------------------------------
// CLI definitions
// ---------------------------------------------------------------------------

/// Find your Chattanooga City Council district, polling place, and
/// candidates.
#[derive(Parser)]
#[command(name = "chattanooga_vote")]
#[command(about = "Find your Chattanooga City Council district, polling place, and candidates")]
struct Cli {
    /// Directory holding `district_boundaries.geojson`,
    /// `polling_places.csv`, and `council_members.csv`.
    #[arg(long, default_value = "data", global = true)]
    data_dir: PathBuf,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Look up the district, polling place, and candidates for an address.
    Lookup {
        /// Street address with ZIP code (e.g. "700 River Terminal Rd, 37406").
        #[arg(required = true, num_args = 1..)]
        address: Vec<String>,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check an address without contacting the geocoder.
    Validate {
        #[arg(required = true, num_args = 1..)]
        address: Vec<String>,
    },

    /// Suggest complete addresses for a partially typed one.
    Suggest {
        #[arg(required = true, num_args = 1..)]
        partial: Vec<String>,
    },

    /// List the loaded council districts.
    Districts,

    /// List 2025 council candidates.
    Candidates {
        /// Only candidates for this district (e.g. "5" or "District 5").
        #[arg(long)]
        district: Option<String>,
    },

    /// Check registration details and point to the state voter lookup.
    VerifyRegistration {
        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        /// Date of birth as YYYY-MM-DD.
        #[arg(long)]
        dob: String,
    },

    /// Convert the redistricting CSV export into the boundary `GeoJSON`.
    ImportBoundaries {
        /// Redistricting CSV with `District Name` and WKT `polygon` columns.
        #[arg(long)]
        csv: PathBuf,

        /// Output path (e.g. `data/district_boundaries.geojson`).
        #[arg(long)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Lookup { address, json } => {
            cmd_lookup(&cli.data_dir, &address.join(" "), json).await
        }
        Commands::Validate { address } => cmd_validate(&address.join(" ")),
        Commands::Suggest { partial } => cmd_suggest(&partial.join(" ")).await,
        Commands::Districts => {
            cmd_districts(&cli.data_dir);
            Ok(())
        }
        Commands::Candidates { district } => {
            cmd_candidates(district.as_deref());
            Ok(())
        }
        Commands::VerifyRegistration {
            first_name,
            last_name,
            dob,
        } => cmd_verify_registration(&first_name, &last_name, &dob),
        Commands::ImportBoundaries { csv, out } => {
            log::info!("Converting redistricting CSV {}", csv.display());
            let count = chattanooga_vote_spatial::redistricting::convert_file(&csv, &out)?;
            println!("Wrote {count} districts to {}", out.display());
            Ok(())
        }
    }
}

fn build_geocoder() -> Result<Arc<Geocoder>, Box<dyn std::error::Error>> {
    let service = service_from_env();
    Ok(Arc::new(Geocoder::from_service(
        &service,
        ServiceArea::CHATTANOOGA,
    )?))
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn cmd_lookup(
    data_dir: &std::path::Path,
    address: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let reference = Arc::new(ReferenceStore::load(
        ReferencePaths::in_dir(data_dir),
        REFERENCE_TTL,
    ));
    let lookup = DistrictLookup::new(build_geocoder()?, reference);

    log::info!("Looking up '{address}'");
    let outcome = lookup.lookup_address(address).await;
    match &outcome {
        LookupOutcome::Found { info, .. } if info.is_found() => {
            log::info!("Resolved to district {}", info.district_number);
        }
        _ => log::info!("No district for '{address}': {}", outcome.user_message()),
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    match &outcome {
        LookupOutcome::Found { coordinate, info } if info.is_found() => {
            println!(
                "Location: {:.5}, {:.5}",
                coordinate.latitude, coordinate.longitude
            );
            print!("{}", render_info(info));
        }
        _ => println!("{}", outcome.user_message()),
    }
    Ok(())
}

fn cmd_validate(address: &str) -> Result<(), Box<dyn std::error::Error>> {
    let valid = check_address(address, &ServiceArea::CHATTANOOGA)
        .map_err(|e| format!("Invalid address: {e}"))?;
    println!(
        "Valid: street number {}, ZIP {}",
        valid.street_number, valid.zip
    );
    Ok(())
}

fn cmd_verify_registration(
    first_name: &str,
    last_name: &str,
    dob: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let today = chrono::Local::now().date_naive();
    let check = check_registration(first_name, last_name, dob, today)?;
    log::info!(
        "Registration details accepted for {} {}",
        check.first_name,
        check.last_name
    );
    println!("{}", check.message());
    Ok(())
}

async fn cmd_suggest(partial: &str) -> Result<(), Box<dyn std::error::Error>> {
    let geocoder = build_geocoder()?;
    let suggestions = geocoder.suggest(partial).await;
    if suggestions.is_empty() {
        println!("No suggestions.");
    }
    for suggestion in suggestions {
        println!("{suggestion}");
    }
    Ok(())
}

fn cmd_districts(data_dir: &std::path::Path) {
    let data = ReferenceData::load(&ReferencePaths::in_dir(data_dir));
    if data.districts.is_empty() {
        println!(
            "No district boundaries loaded from {}. Create them with `import-boundaries`.",
            data_dir.display()
        );
        return;
    }

    println!("=== Council Districts ===");
    for boundary in data.districts.districts() {
        let id = &boundary.metadata.id;
        let description = boundary
            .metadata
            .description
            .as_deref()
            .unwrap_or("(no description)");
        let member = data
            .council_member(id)
            .map_or("(no council member on file)", |m| m.name.as_str());
        println!("{id:>3}  {description}  -  {member}");

        if let Some(demo) = &boundary.metadata.demographics {
            println!(
                "     population {}: {:.1}% white, {:.1}% Black, {:.1}% Hispanic, {:.1}% other",
                demo.total_population,
                demo.percent_white,
                demo.percent_black,
                demo.percent_hispanic,
                demo.percent_other
            );
        }
    }
}

fn cmd_candidates(district: Option<&str>) {
    let registry = candidates_2025();
    let filter = district.and_then(normalize_district_id);

    println!("=== {} ===", registry.election);
    for (id, candidates) in registry.by_district() {
        if filter.as_ref().is_some_and(|f| *f != id) {
            continue;
        }
        println!();
        println!("District {id}");
        for candidate in candidates {
            println!("  {}", candidate.name);
            let contact = &candidate.contact;
            for (label, value) in [
                ("website", &contact.website),
                ("email", &contact.email),
                ("phone", &contact.phone),
                ("facebook", &contact.facebook),
                ("instagram", &contact.instagram),
                ("linkedin", &contact.linkedin),
                ("twitter", &contact.twitter),
            ] {
                if let Some(value) = value {
                    println!("    {label:<9} {value}");
                }
            }
        }
    }
}

/// Plain-text fact sheet for a resolved district.
fn render_info(info: &DistrictInfo) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    let _ = writeln!(out, "District: {}", info.district_number);
    if let Some(description) = &info.district_description {
        let _ = writeln!(out, "  {description}");
    }
    if let Some(tier) = info.resolution {
        let _ = writeln!(out, "  matched by: {tier}");
    }

    if let Some(member) = &info.council_member {
        let _ = writeln!(out, "Council member: {}", member.name);
        for value in [&member.email, &member.phone].into_iter().flatten() {
            let _ = writeln!(out, "  {value}");
        }
    }

    if info.has_polling_place() {
        let _ = writeln!(out, "Polling place: {}", info.polling_place);
        let _ = writeln!(out, "  {}", info.polling_address);
        let _ = writeln!(out, "  precinct: {}", info.precinct);
    } else {
        let _ = writeln!(
            out,
            "Polling place: not found. Contact the {ELECTION_COMMISSION_CONTACT}."
        );
    }

    if info.candidates.is_empty() {
        let _ = writeln!(out, "Candidates: none on file");
    } else {
        let _ = writeln!(out, "Candidates:");
        for candidate in &info.candidates {
            let _ = writeln!(out, "  {candidate}");
        }
    }
    out
}
