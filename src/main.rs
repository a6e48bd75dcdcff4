use anyhow::{bail, Context, Result};
use bookrec::config::OutputFormat;
use bookrec::{init_tracing, recommend_from_files, Config, PipelineResult};
use clap::{Parser, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(help = "Rating CSV files with ID, Name and Rating columns")]
    inputs: Vec<PathBuf>,

    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    #[arg(long)]
    nbook_ratings: Option<usize>,

    #[arg(long)]
    nuser_ratings: Option<usize>,

    #[arg(short, long, help = "Number of singular components kept")]
    rank: Option<usize>,

    #[arg(short = 'k', long, help = "Recommendations per user")]
    top_k: Option<usize>,

    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, long, value_enum)]
    format: Option<Format>,

    #[arg(
        short,
        long,
        help = "Print one user's ratings and recommendations instead of the table"
    )]
    user: Option<usize>,

    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Csv => OutputFormat::Csv,
            Format::Json => OutputFormat::Json,
        }
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = if std::path::Path::new(&args.config).exists() {
        Config::from_file(&args.config)
            .with_context(|| format!("Failed to load config from {}", args.config))?
    } else {
        info!("Config file not found, using default configuration");
        Config::default()
    };

    if !args.inputs.is_empty() {
        config.ingestion.inputs = args.inputs.clone();
    }
    if let Some(n) = args.nbook_ratings {
        config.pipeline.nbook_ratings = n;
    }
    if let Some(n) = args.nuser_ratings {
        config.pipeline.nuser_ratings = n;
    }
    if let Some(rank) = args.rank {
        config.pipeline.rank = rank;
    }
    if let Some(k) = args.top_k {
        config.pipeline.top_k = k;
    }
    if let Some(ref output) = args.output {
        config.output.path = Some(output.clone());
    }
    if let Some(format) = args.format {
        config.output.format = format.into();
    }

    Ok(config)
}

fn write_user(result: &PipelineResult, user_index: usize, mut out: impl Write) -> Result<()> {
    let row = result.recommendations_for_user(user_index)?;
    writeln!(out, "User {} (index {})", row.user_id, row.user_index)?;

    writeln!(out, "Rated:")?;
    for entry in result.ratings_for_user(user_index)? {
        writeln!(out, "  {}\t{}", entry.book, entry.rating)?;
    }

    writeln!(out, "Recommended:")?;
    for slot in &row.slots {
        writeln!(out, "  {}\t{}", slot.book(), slot.rating())?;
    }
    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    std::env::set_var("RUST_LOG", &args.log_level);
    init_tracing();

    let config = load_config(&args)?;
    if config.ingestion.inputs.is_empty() {
        bail!("No input files given (pass them as arguments or set ingestion.inputs)");
    }
    info!("Pipeline configuration: {:?}", config.pipeline);

    let result = recommend_from_files(&config.ingestion.inputs, &config.pipeline)?;
    info!("Run summary: {}", serde_json::to_string(&result.summary)?);

    let mut out: Box<dyn Write> = match &config.output.path {
        Some(path) => Box::new(std::io::BufWriter::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    };

    if let Some(user_index) = args.user {
        return write_user(&result, user_index, &mut out);
    }

    match config.output.format {
        OutputFormat::Csv => result.recommendations.write_csv(&mut out)?,
        OutputFormat::Json => result.recommendations.write_json(&mut out)?,
    }
    // BufWriter drops flush errors, so flush explicitly
    out.flush()?;

    info!(
        "Wrote recommendations for {} users",
        result.recommendations.len()
    );
    Ok(())
}
