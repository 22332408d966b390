use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use minor_finder::catalog::{CatalogBackend, CatalogSource, HttpCatalog, StaticCatalog};
use minor_finder::config::AppConfig;
use minor_finder::progress::{
    compute_recommendations, plan_remaining, render_minor, ExperienceFlags, RecommendationReport,
    RecommendationRequest, Recommendations, NO_MATCHES_MESSAGE,
};
use minor_finder::requirements::parse_code_list;
use minor_finder::server::create_router;
use minor_finder::types::AppState;
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    name = "minor_finder",
    about = "Ranks minors by how close a student is to completing them"
)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Read the catalog from a JSON snapshot instead of the web
    #[arg(long = "catalog-file")]
    catalog_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Rank minors against completed courses
    Recommend {
        /// Courses taken here, comma separated (e.g. CS18000,MA16100)
        #[arg(long, default_value = "")]
        courses: String,
        /// Transfer or test credit, comma separated
        #[arg(long, default_value = "")]
        external: String,
        /// Current major; its namesake minor is left out
        #[arg(long)]
        major: Option<String>,
        /// Current semester, 1 through 8
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=8))]
        semester: u32,
        #[arg(long = "study-abroad")]
        study_abroad: bool,
        #[arg(long = "international-internship")]
        international_internship: bool,
        #[arg(long)]
        json: bool,
        /// Spread remaining courses over the following semesters
        #[arg(long)]
        plan: bool,
    },
    /// List every minor in the catalog
    Minors,
    /// List every major
    Majors,
    /// Save the whole catalog to a JSON snapshot
    Snapshot {
        #[arg(long)]
        out: PathBuf,
    },
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;
    let backend = match &cli.catalog_file {
        Some(path) => CatalogBackend::Snapshot(
            StaticCatalog::load(path)
                .with_context(|| format!("loading catalog snapshot {}", path.display()))?,
        ),
        None => CatalogBackend::Http(HttpCatalog::new(config.catalog.clone())?),
    };

    match cli.command {
        Commands::Recommend {
            courses,
            external,
            major,
            semester,
            study_abroad,
            international_internship,
            json,
            plan,
        } => {
            let mut request = RecommendationRequest::from_codes(
                parse_code_list(&courses)?,
                parse_code_list(&external)?,
                semester,
            );
            request.current_major = major;
            request.flags = ExperienceFlags {
                study_abroad,
                international_internship,
            };

            let recommendations = compute_recommendations(
                &backend,
                &request,
                config.catalog.fetch_concurrency,
            )
            .await?;
            let per_semester = plan.then_some(config.schedule.per_semester);

            if json {
                let report = RecommendationReport::build(&recommendations, semester, per_semester);
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_recommendations(&recommendations, semester, per_semester);
            }
        }
        Commands::Minors => {
            for minor in backend.list_minors().await? {
                println!("{}\t{}", minor.name, minor.link);
            }
        }
        Commands::Majors => {
            for major in backend.list_majors().await? {
                println!("{major}");
            }
        }
        Commands::Snapshot { out } => {
            let snapshot = StaticCatalog::capture(&backend).await?;
            snapshot.save(&out)?;
            info!(
                minors = snapshot.entries().len(),
                path = %out.display(),
                "Wrote catalog snapshot"
            );
        }
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let bind = format!("{host}:{port}");
            let addr: SocketAddr = bind
                .parse()
                .map_err(|e| anyhow!("invalid bind address {bind}: {e}"))?;

            let state = Arc::new(AppState::new(backend, config));
            let _cleanup = state.spawn_cache_cleanup();
            let listener = tokio::net::TcpListener::bind(addr).await?;
            info!(addr = %addr, "Listening");
            axum::serve(listener, create_router(state))
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await?;
        }
    }

    Ok(())
}

fn print_recommendations(
    recommendations: &Recommendations,
    current_semester: u32,
    per_semester: Option<usize>,
) {
    let results = match recommendations {
        Recommendations::NoMatches => {
            println!("{NO_MATCHES_MESSAGE}");
            return;
        }
        Recommendations::Ranked(results) => results,
    };

    for result in results {
        println!("{}", render_minor(result));
        let Some(per_semester) = per_semester else {
            continue;
        };
        for semester in plan_remaining(&result.remaining_codes(), current_semester, per_semester) {
            let courses: Vec<String> = semester.courses.iter().map(|c| c.spaced()).collect();
            println!("{}: {}", semester.label(), courses.join(", "));
        }
        println!();
    }
}
