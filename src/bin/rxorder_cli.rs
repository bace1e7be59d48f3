//! CLI tool for rxorder - inspects templates and generates order workbooks
//!
//! Usage:
//!   rxorder options                          # Dropdown lists as JSON
//!   rxorder schema                           # Column schema as JSON
//!   rxorder generate -i rows.json -o out/    # Fill the template
//!   rxorder encode-blob template.xlsm        # Base64 blob for embedding

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use rxorder::{encode_blob, ByteSource, Profile, Result, Session};

#[derive(Parser)]
#[command(version, about = "Fill RX order lines into a prepared spreadsheet template.")]
struct Args {
    /// Profile JSON (defaults to the built-in RX order profile).
    #[arg(long, global = true)]
    profile: Option<PathBuf>,

    /// Template file, overriding the profile's template location.
    #[arg(long, global = true)]
    template: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the option lists loaded from the reference sheet.
    Options,
    /// Print the column schema.
    Schema,
    /// Generate an order workbook from JSON row records.
    Generate {
        /// JSON array of row objects keyed by column id or label ("-" for stdin).
        #[arg(short, long)]
        input: String,
        /// Output directory.
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
    /// Encode a spreadsheet as a base64 text blob.
    EncodeBlob {
        input: PathBuf,
        /// Output file (stdout when omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let profile = match &args.profile {
        Some(path) => Profile::load(path)?,
        None => Profile::default(),
    };

    match args.command {
        Command::Schema => print_text(&serde_json::to_string_pretty(&profile.columns)?),
        Command::Options => {
            let session = start_session(profile, args.template)?;
            print_text(&serde_json::to_string_pretty(session.options())?)
        }
        Command::Generate { input, output } => {
            let mut session = start_session(profile, args.template)?;
            session.load_records_json(&read_input(&input)?)?;
            let artifact = session.generate()?;
            fs::create_dir_all(&output)?;
            let path = artifact.write_to_dir(&output)?;
            eprintln!("Written: {} ({})", path.display(), artifact.mime_type);
            Ok(())
        }
        Command::EncodeBlob { input, output } => {
            let blob = encode_blob(&fs::read(&input)?);
            match output {
                Some(path) => {
                    fs::write(&path, blob)?;
                    eprintln!("Written: {}", path.display());
                    Ok(())
                }
                None => print_text(&blob),
            }
        }
    }
}

fn start_session(profile: Profile, template: Option<PathBuf>) -> Result<Session> {
    match template {
        Some(path) => Session::start(profile, ByteSource::file(path)),
        None => Session::from_profile(profile),
    }
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn print_text(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    writeln!(stdout)?;
    Ok(())
}
