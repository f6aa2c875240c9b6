//! Command-line front-end for the cloakid codec: generates identifiers
//! and decodes them back into their structured fields. Thin glue only;
//! all layout logic lives in the `cloakid` library.

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use cloakid::Alphabet;
use cloakid::IdCodec;
use cloakid::Settings;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogOutputFormat {
    Json,
    Pretty,
}

/// Command line arguments for the cloakid tool.
#[derive(Debug, Parser)]
#[clap(name = "cloakid")]
struct Cli {
    #[clap(short = 'o', long = "output-format", default_value = "pretty")]
    output_format: LogOutputFormat,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate one or more identifiers.
    Generate(GenerateArgs),
    /// Decode an identifier and print its fields as JSON.
    Decode(DecodeArgs),
}

#[derive(Debug, clap::Args)]
struct GenerateArgs {
    /// Number of identifiers to generate.
    #[clap(short = 'n', long, default_value_t = 1)]
    count: usize,

    /// Timestamp field width in bits; 0 disables the timestamp.
    #[clap(long, default_value_t = cloakid::DEFAULT_TIMESTAMP_BITS)]
    timestamp_bits: u8,

    /// Random field width in bits.
    #[clap(long, default_value_t = cloakid::DEFAULT_ENTROPY_BITS)]
    entropy_bits: u16,

    /// Custom base alphabet; defaults to the 58-character
    /// ambiguity-reduced set.
    #[clap(long)]
    alphabet: Option<String>,
}

#[derive(Debug, clap::Args)]
struct DecodeArgs {
    /// The identifier to decode.
    id: String,

    /// The alphabet the identifier was generated with. Field widths are
    /// self-described and never need to be supplied.
    #[clap(long)]
    alphabet: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let pretty = matches!(cli.output_format, LogOutputFormat::Pretty);
    setup_logging("info", pretty);

    match cli.command {
        Command::Generate(args) => {
            let codec = IdCodec::new(Settings {
                alphabet: parse_alphabet(args.alphabet.as_deref())?,
                timestamp_bits: args.timestamp_bits,
                entropy_bits: args.entropy_bits,
            })?;
            tracing::debug!(
                timestamp_bits = args.timestamp_bits,
                entropy_bits = args.entropy_bits,
                encoded_len = codec.encoded_len(),
                "generating identifiers",
            );
            for _ in 0..args.count {
                println!("{}", codec.generate());
            }
        }
        Command::Decode(args) => {
            // Widths are read out of the identifier itself; the decoder
            // only needs the alphabet, so the defaults are fine here.
            let codec = IdCodec::new(Settings {
                alphabet: parse_alphabet(args.alphabet.as_deref())?,
                ..Settings::default()
            })?;
            let decoded = codec.decode(&args.id)?;
            println!("{}", serde_json::to_string_pretty(&decoded)?);
        }
    }

    Ok(())
}

fn parse_alphabet(arg: Option<&str>) -> Result<Alphabet, cloakid::AlphabetError> {
    match arg {
        Some(alphabet) => Alphabet::new(alphabet),
        None => Ok(Alphabet::default()),
    }
}

/// Configures stdout/err logging; JSON output for machine consumption,
/// pretty output for a terminal.
fn setup_logging(directives: &str, pretty: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    if pretty {
        let main_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_timer(UtcTime::rfc_3339());

        tracing_subscriber::registry()
            .with(env_filter)
            .with(main_layer)
            .init()
    } else {
        let main_layer = tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_target(false)
            .with_current_span(true)
            .with_span_list(true)
            .with_line_number(true)
            .with_file(true)
            .with_timer(UtcTime::rfc_3339());

        tracing_subscriber::registry()
            .with(env_filter)
            .with(main_layer)
            .init()
    }
}
