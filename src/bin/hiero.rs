//! hiero CLI — XML <-> binary hierarchical stream conversion.

#[cfg(feature = "fast-alloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use hiero::{
    copy, BinaryReader, BinaryWriter, CharMode, Error, HierarchicalWriter, StatefulWriter,
    XmlReader, XmlWriter, XmlWriterConfig,
};
use std::fs::File;
use std::io::{BufReader, BufWriter, IsTerminal, Read, Write};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "hiero", about = "XML <-> binary hierarchical stream conversion")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode XML to the binary stream format
    Encode(EncodeArgs),
    /// Decode a binary stream to XML
    Decode(DecodeArgs),
}

#[derive(Args)]
struct EncodeArgs {
    /// Input XML file (stdin if omitted)
    input: Option<PathBuf>,

    /// Output file (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct DecodeArgs {
    /// Input binary file (stdin if omitted)
    input: Option<PathBuf>,

    /// Output file (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Suppress indentation and newlines
    #[arg(long)]
    compact: bool,

    /// Indent width in spaces (ignored with --compact)
    #[arg(long, default_value_t = 2)]
    indent: usize,

    /// Character validity mode for the XML output
    #[arg(long, value_enum, default_value_t = ModeArg::Quirks)]
    mode: ModeArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Alles erlaubt; Sonderfaelle als numerische Referenzen
    Quirks,
    /// XML 1.0 Control-Character-Regeln
    Xml10,
    /// XML 1.1 (permissiv, ohne U+FFFE/U+FFFF)
    Xml11,
}

impl From<ModeArg> for CharMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Quirks => CharMode::Quirks,
            ModeArg::Xml10 => CharMode::Xml10,
            ModeArg::Xml11 => CharMode::Xml11,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    match cli.command {
        Command::Encode(args) => {
            let mut reader = XmlReader::new(open_input(args.input.as_deref())?)?;
            let mut writer = StatefulWriter::new(BinaryWriter::new(open_output(args.output.as_deref())?));
            copy(&mut reader, &mut writer)?;
            writer.flush()?;
            writer.close()
        }
        Command::Decode(args) => {
            let config = if args.compact {
                XmlWriterConfig::compact()
            } else {
                XmlWriterConfig {
                    indent: " ".repeat(args.indent),
                    ..XmlWriterConfig::default()
                }
            }
            .with_mode(args.mode.into());
            let mut reader = BinaryReader::new(open_input(args.input.as_deref())?)?;
            let mut writer = XmlWriter::with_config(open_output(args.output.as_deref())?, config);
            copy(&mut reader, &mut writer)?;
            writer.close()
        }
    }
}

fn open_input(path: Option<&std::path::Path>) -> Result<Box<dyn Read>, Error> {
    match path {
        Some(p) => {
            let file = File::open(p)
                .map_err(|e| Error::IoError(format!("open {}: {e}", p.display())))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => {
            let stdin = std::io::stdin();
            if stdin.is_terminal() {
                return Err(Error::IoError(
                    "no input file given and stdin is a terminal".into(),
                ));
            }
            Ok(Box::new(stdin))
        }
    }
}

fn open_output(path: Option<&std::path::Path>) -> Result<Box<dyn Write>, Error> {
    match path {
        Some(p) => {
            let file = File::create(p)
                .map_err(|e| Error::IoError(format!("create {}: {e}", p.display())))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(std::io::stdout()))),
    }
}
