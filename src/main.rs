extern crate panorama;

use clap::Parser;
use panorama::charts::default_hover_notes;
use panorama::layout::SourceLayout;
use panorama::output::FileOutput;
use panorama::page::Theme;
use panorama::{run_dashboard, DashboardFlags};
use std::fs;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Default, Debug)]
#[clap(author, version, about, long_about = None)]
struct DashboardArgs {
    #[arg(help = "Path to the annual consumption by state file in .csv format")]
    consumption_file: PathBuf,
    #[arg(help = "Path to the monthly gross generation by state file in .csv format")]
    generation_file: PathBuf,
    #[arg(
        long,
        short,
        default_value = ".",
        help = "Directory the dashboard files are written to"
    )]
    output_dir: PathBuf,
    #[arg(
        long,
        short,
        help = "Path to a JSON file overriding parts of the source file layout"
    )]
    layout: Option<PathBuf>,
    #[arg(long, default_value_t = false, help = "Also write the figures as JSON")]
    figures_json: bool,
    #[arg(
        long,
        default_value_t = false,
        help = "Also write the combined table and summaries as .csv files"
    )]
    summary_csv: bool,
    #[arg(long, default_value_t = false, help = "Do not write the HTML page")]
    no_page: bool,
    #[arg(long, short, default_value_t = false, help = "Log at debug level")]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = DashboardArgs::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let layout = match &args.layout {
        Some(path) => SourceLayout::from_json(BufReader::new(File::open(path)?))?,
        None => Default::default(),
    };

    fs::create_dir_all(&args.output_dir)?;
    let file_output = FileOutput::new(args.output_dir.clone(), "{}.{}".to_string());

    let run = run_dashboard(
        BufReader::new(File::open(&args.consumption_file)?),
        BufReader::new(File::open(&args.generation_file)?),
        &file_output,
        &layout,
        &default_hover_notes(),
        &Theme::default(),
        (&args).into(),
    )?;

    info!(
        charts = run.charts.len(),
        output_dir = %args.output_dir.display(),
        "dashboard written"
    );

    Ok(())
}

impl From<&DashboardArgs> for DashboardFlags {
    fn from(args: &DashboardArgs) -> Self {
        let mut flags = DashboardFlags::empty();
        if !args.no_page {
            flags.insert(DashboardFlags::WRITE_PAGE);
        }
        if args.figures_json {
            flags.insert(DashboardFlags::WRITE_FIGURES_JSON);
        }
        if args.summary_csv {
            flags.insert(DashboardFlags::WRITE_SUMMARY_CSV);
        }
        flags
    }
}
