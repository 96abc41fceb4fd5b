use std::path::PathBuf;
use std::process;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use kokkai::config::{self, Config};
use kokkai::harvest::Harvest;
use kokkai::report::{self, Report};
use kokkai::scraper::HttpClient;
use kokkai::types::{House, MeetingSummary};
use kokkai::{Layout, sangiin, shugiin};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "kokkai")]
#[command(about = "A shugiintv.go.jp / webtv.sangiin.go.jp proceedings scraper", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        default_value = "info",
        global = true,
        value_parser = parse_level,
        help = "Logging level: off, error, warn, info, debug or trace"
    )]
    log_level: LevelFilter,

    #[arg(long, default_value_t = config::DEFAULT_TERM, global = true, help = "Diet session number")]
    term: u32,

    #[arg(
        long = "delay-ms",
        default_value_t = config::DEFAULT_DELAY_MS,
        global = true,
        help = "Pause after every request, in milliseconds"
    )]
    delay_ms: u64,

    #[arg(
        long = "out-dir",
        default_value = ".",
        global = true,
        help = "Directory for CSV caches and reports"
    )]
    out_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape meeting pages and cache one row per speech
    Meetings {
        #[arg(value_parser = parse_house, help = "shugiin (lower) or sangiin (upper)")]
        house: House,

        #[arg(
            long,
            value_name = "YYYY-MM-DD",
            help = "First day to list (lower house)",
            value_parser = parse_date,
        )]
        start_date: Option<NaiveDate>,

        #[arg(
            long,
            value_name = "YYYY-MM-DD",
            help = "Last day to list (lower house)",
            value_parser = parse_date,
        )]
        end_date: Option<NaiveDate>,

        #[arg(long, help = "First sid to try (upper house)")]
        sid_begin: Option<u32>,

        #[arg(long, help = "Last sid to try (upper house)")]
        sid_end: Option<u32>,
    },
    /// Scrape the member roster of a house
    Members {
        #[arg(value_parser = parse_house)]
        house: House,
    },
    /// Scrape the written questions of the term
    Questions {
        #[arg(value_parser = parse_house)]
        house: House,
    },
    /// Merge the cached rows with the roster and write the report workbook
    Report {
        #[arg(value_parser = parse_house)]
        house: House,
    },
    /// Parse a single meeting detail page
    Detail {
        #[arg(value_parser = parse_house)]
        house: House,

        #[arg(help = "URL of the meeting detail page")]
        url: String,

        #[arg(
            long,
            value_name = "YYYY-MM-DD",
            help = "Meeting date (required for the lower house)",
            value_parser = parse_date,
        )]
        date: Option<NaiveDate>,

        #[arg(long, help = "Meeting name (lower house)")]
        name: Option<String>,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
}

fn parse_house(s: &str) -> Result<House, String> {
    House::from_str(s).map_err(|e| e.to_string())
}

fn parse_level(s: &str) -> Result<LevelFilter, String> {
    LevelFilter::from_str(s).map_err(|_| format!("Unknown log level '{}'", s))
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| e.to_string())
}

fn serialize_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

fn fail(context: &str, e: impl std::fmt::Display) -> ! {
    log::error!("{}: {}", context, e);
    process::exit(1);
}

fn print_harvest(house: House, harvest: &Harvest) {
    println!(
        "{}: {} meeting(s), {} row(s), {} page(s) skipped",
        house,
        harvest.meetings.len(),
        harvest.rows().len(),
        harvest.skipped.len()
    );
    for skip in &harvest.skipped {
        println!("  skipped {} ({})", skip.url, skip.reason);
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level)
        .init();

    let base = Config {
        term: cli.term,
        request_delay: Duration::from_millis(cli.delay_ms),
        output_dir: cli.out_dir,
        ..Config::default()
    };

    match cli.command {
        Commands::Meetings {
            house,
            start_date,
            end_date,
            sid_begin,
            sid_end,
        } => {
            let config = Config {
                date_start: start_date.unwrap_or(base.date_start),
                date_end: end_date.unwrap_or(base.date_end),
                sid_begin: sid_begin.unwrap_or(base.sid_begin),
                sid_end: sid_end.unwrap_or(base.sid_end),
                ..base
            }
            .validate()
            .unwrap_or_else(|e| fail("Invalid args", e));

            let harvest = match house {
                House::Shugiin => {
                    let scraper = shugiin::WebScraper::new(&config)
                        .unwrap_or_else(|e| fail("Error creating scraper", e));
                    scraper.fetch_meetings(config.dates()).await
                }
                House::Sangiin => {
                    let scraper = sangiin::WebScraper::new(&config)
                        .unwrap_or_else(|e| fail("Error creating scraper", e));
                    scraper.fetch_meetings(config.sids()).await
                }
            };

            let path = report::meetings_cache(&config.output_dir, house);
            report::write_csv(&path, &harvest.rows())
                .unwrap_or_else(|e| fail("Error writing meetings", e));
            print_harvest(house, &harvest);
        }
        Commands::Members { house } => {
            let config = base.validate().unwrap_or_else(|e| fail("Invalid args", e));

            let members = match house {
                House::Shugiin => {
                    let scraper = shugiin::WebScraper::new(&config)
                        .unwrap_or_else(|e| fail("Error creating scraper", e));
                    scraper.fetch_members().await
                }
                House::Sangiin => {
                    let scraper = sangiin::WebScraper::new(&config)
                        .unwrap_or_else(|e| fail("Error creating scraper", e));
                    scraper
                        .fetch_members()
                        .await
                        .unwrap_or_else(|e| fail("Error fetching members", e))
                }
            };

            let path = report::members_cache(&config.output_dir, house);
            report::write_csv(&path, &members)
                .unwrap_or_else(|e| fail("Error writing members", e));
            println!("{}: {} member(s)", house, members.len());
        }
        Commands::Questions { house } => {
            let config = base.validate().unwrap_or_else(|e| fail("Invalid args", e));

            let questions = match house {
                House::Shugiin => {
                    let scraper = shugiin::WebScraper::new(&config)
                        .unwrap_or_else(|e| fail("Error creating scraper", e));
                    scraper.fetch_questions().await
                }
                House::Sangiin => {
                    let scraper = sangiin::WebScraper::new(&config)
                        .unwrap_or_else(|e| fail("Error creating scraper", e));
                    scraper.fetch_questions().await
                }
            }
            .unwrap_or_else(|e| fail("Error fetching questions", e));

            let path = report::questions_cache(&config.output_dir, house);
            report::write_csv(&path, &questions)
                .unwrap_or_else(|e| fail("Error writing questions", e));
            println!("{}: {} question(s)", house, questions.len());
        }
        Commands::Report { house } => {
            let report = Report::load(&base.output_dir, house)
                .unwrap_or_else(|e| fail("Error loading caches", e));
            let out = report
                .write(&base.output_dir)
                .unwrap_or_else(|e| fail("Error writing report", e));
            println!("{} report written to {}", house, out.display());
        }
        Commands::Detail {
            house,
            url,
            date,
            name,
            format,
        } => {
            let layout = match house {
                House::Shugiin => {
                    let Some(date) = date else {
                        fail("Invalid args", "--date is required for the lower house");
                    };
                    Layout::Shugiin {
                        date,
                        summary: MeetingSummary {
                            name: name.unwrap_or_default(),
                            detail_url: url.clone(),
                        },
                    }
                }
                House::Sangiin => Layout::Sangiin,
            };

            let http = HttpClient::new(base.request_delay)
                .unwrap_or_else(|e| fail("Error creating client", e));
            let html = http
                .get_html(&url)
                .await
                .unwrap_or_else(|e| fail("Error fetching meeting", e));
            let meeting = layout
                .extract(&html)
                .unwrap_or_else(|e| fail("Error parsing meeting", e));

            match format {
                OutputFormat::Json => serialize_json(&meeting),
                OutputFormat::Text => print!("{}", meeting),
            }
        }
    }
}
