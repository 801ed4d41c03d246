use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::style::Stylize;
use crossterm::tty::IsTty;
use decoder_core::core::phrase_table::PhraseTable;
use decoder_core::persistence::save_phrase_table;
use decoder_core::{
    init_moses, output_weights, Decoded, Decoder, DecoderError, MosesDecoder, RandomDecoder,
};
use log::warn;
use serde_json::json;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode, WriteLogger};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(name = "decoder", about = "Phrase-based decoder for sampling experiments")]
struct Args {
    /// Debug level: 0 warnings, 1 info, 2 debug, 3 trace.
    #[clap(short = 'v', long, default_value_t = 0)]
    verbosity: i32,

    /// Write the log to this file instead of stderr.
    #[clap(long)]
    log_file: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Translates stdin, one sentence per line.
    Decode {
        /// Decoder ini file.
        #[clap(short = 'f', long)]
        config: PathBuf,

        /// Build random hypotheses instead of searching for the best.
        #[clap(long)]
        random: bool,

        /// Seed for --random.
        #[clap(long)]
        seed: Option<u64>,

        /// Number of distinct translations to print per sentence.
        #[clap(short = 'n', long, default_value_t = 1)]
        nbest: usize,

        /// Print one JSON object per sentence.
        #[clap(long)]
        json: bool,

        /// Engine overrides, e.g. `-- -stack 200 -weight-l 0.6`.
        #[clap(last = true)]
        engine_args: Vec<String>,
    },
    /// Prints the feature names and weights.
    Weights {
        #[clap(short = 'f', long)]
        config: PathBuf,

        #[clap(last = true)]
        engine_args: Vec<String>,
    },
    /// Converts a text phrase table into the binary cache format.
    Binarize {
        #[clap(short = 'i', long)]
        input: PathBuf,

        /// Number of scores per phrase pair.
        #[clap(short = 's', long)]
        scores: usize,

        #[clap(short = 'o', long)]
        output: PathBuf,

        #[clap(long, default_value = "|")]
        factor_delimiter: String,
    },
}

enum AnyDecoder {
    Moses(MosesDecoder),
    Random(RandomDecoder),
}

impl AnyDecoder {
    fn decode(&mut self, source: &str) -> decoder_core::Result<Decoded> {
        match self {
            AnyDecoder::Moses(d) => d.decode(source),
            AnyDecoder::Random(d) => d.decode(source),
        }
    }

    fn engine(&self) -> &MosesDecoder {
        match self {
            AnyDecoder::Moses(d) => d,
            AnyDecoder::Random(d) => d.engine(),
        }
    }
}

fn level_for(verbosity: i32) -> LevelFilter {
    match verbosity {
        i32::MIN..=0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn init_logging(args: &Args) -> Result<()> {
    let level = level_for(args.verbosity);
    match &args.log_file {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("cannot create log file {}", path.display()))?;
            WriteLogger::init(level, Config::default(), file)?;
        }
        None => TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto)?,
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    match args.command {
        Command::Decode { config, random, seed, nbest, json, engine_args } => {
            init_moses(&config, args.verbosity, &engine_args)
                .with_context(|| format!("cannot initialise decoder from {}", config.display()))?;
            let decoder = if random {
                AnyDecoder::Random(match seed {
                    Some(seed) => RandomDecoder::with_seed(seed)?,
                    None => RandomDecoder::new()?,
                })
            } else {
                AnyDecoder::Moses(MosesDecoder::new()?)
            };
            decode_stream(decoder, nbest.max(1), json)
        }
        Command::Weights { config, engine_args } => {
            init_moses(&config, args.verbosity, &engine_args)
                .with_context(|| format!("cannot initialise decoder from {}", config.display()))?;
            output_weights(&mut io::stdout().lock())?;
            Ok(())
        }
        Command::Binarize { input, scores, output, factor_delimiter } => {
            let file = File::open(&input).with_context(|| format!("cannot open {}", input.display()))?;
            let table = PhraseTable::parse_text(BufReader::new(file), &input, scores, &factor_delimiter)?;
            save_phrase_table(&table, &output)?;
            eprintln!("Wrote {} phrase pairs to {}", table.len(), output.display());
            Ok(())
        }
    }
}

fn decode_stream(mut decoder: AnyDecoder, nbest: usize, as_json: bool) -> Result<()> {
    let stdin = io::stdin();
    let styled = io::stdout().is_tty() && !as_json;
    let mut out = BufWriter::new(io::stdout().lock());

    for (line_no, line) in stdin.lock().lines().enumerate() {
        let line = line?;
        let decoded = match decoder.decode(&line) {
            Ok(decoded) => decoded,
            Err(DecoderError::EmptySource) => {
                warn!("line {} is empty", line_no + 1);
                writeln!(out)?;
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let best = decoded.best.output_phrase();
        let translations: Vec<(String, f32)> = decoder
            .engine()
            .translations()
            .iter()
            .take(nbest)
            .map(|(t, score)| (t.iter().map(|f| f.as_ref()).collect::<Vec<_>>().join(" "), *score))
            .collect();

        if as_json {
            let record = json!({
                "line": line_no,
                "source": line.trim(),
                "translation": best,
                "score": decoded.best.total_score(),
                "nbest": translations
                    .iter()
                    .map(|(t, s)| json!({ "translation": t, "score": s }))
                    .collect::<Vec<_>>(),
            });
            writeln!(out, "{}", record)?;
        } else if nbest > 1 {
            for (t, s) in &translations {
                writeln!(out, "{} ||| {} ||| {}", line_no, t, s)?;
            }
        } else if styled {
            writeln!(out, "{}", best.bold().green())?;
        } else {
            writeln!(out, "{}", best)?;
        }
        out.flush()?;
    }
    Ok(())
}
