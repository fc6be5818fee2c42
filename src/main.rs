mod processor;

use subedit::{EditorConfig, SrtStore, SubtitleList, TimeCodeStore};

use std::io::{self, Read, Write};

use anyhow::{anyhow, Context, Result};
use clap::Parser as ClapParser;
use env_logger::{Builder, Env};

fn main() {
    init_logger();
    match run() {
        Ok(()) => (),
        Err(err) => {
            eprintln!("An error occurred: {}", err);
            for cause in err.chain().skip(1) {
                eprintln!("    {}", cause);
            }
            std::process::exit(1);
        }
    }
}

fn init_logger() {
    let env = Env::default().filter_or("RUST_LOG", "warn,subedit=info");
    Builder::from_env(env)
        .target(env_logger::Target::Stderr)
        .init();
}

#[derive(ClapParser)]
#[command(about = "Edit the timing of SRT subtitles")]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "The file to read from. If not supplied, the subtitles will be read from standard input.",
        default_value = "-"
    )]
    input: String,
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "The file to write to. If not supplied, the subtitles will be written to standard output.",
        default_value = "-"
    )]
    output: String,
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Write a backup of the original input to the specified file."
    )]
    backup: Option<String>,
    #[arg(
        short,
        long,
        value_name = "TEXT",
        help = "Insert a subtitle with the given text in front of the first one."
    )]
    leader_text: Option<String>,
    #[arg(
        short,
        long = "drop-pattern",
        value_name = "REGEX",
        help = "Remove every subtitle with a line matching the pattern. May be repeated."
    )]
    drop_patterns: Vec<String>,
    #[arg(
        long,
        value_name = "PIVOT:DURATION",
        value_parser = parse_shift,
        help = "Open a gap of DURATION milliseconds at PIVOT, moving later subtitles forward."
    )]
    shift_forward: Option<(i64, i64)>,
    #[arg(
        long,
        value_name = "PIVOT:DURATION",
        value_parser = parse_shift,
        help = "Cut DURATION milliseconds out of the timeline at PIVOT."
    )]
    shift_backward: Option<(i64, i64)>,
    #[arg(long, help = "Remove the timing of every subtitle.")]
    clear_timings: bool,
    #[arg(
        long,
        value_name = "MILLIS",
        default_value_t = EditorConfig::default().default_duration,
        help = "Duration given to newly inserted subtitles."
    )]
    default_duration: i64,
    #[arg(
        long,
        value_name = "STEPS",
        default_value_t = EditorConfig::default().max_undo_depth,
        help = "Number of edits kept in the undo history."
    )]
    undo_depth: usize,
}

fn parse_shift(arg: &str) -> std::result::Result<(i64, i64), String> {
    let (pivot, duration) = arg
        .split_once(':')
        .ok_or_else(|| format!("expected PIVOT:DURATION, got '{}'", arg))?;
    let pivot = pivot
        .trim()
        .parse()
        .map_err(|_| format!("bad pivot: '{}'", pivot))?;
    let duration: i64 = duration
        .trim()
        .parse()
        .map_err(|_| format!("bad duration: '{}'", duration))?;
    if duration < 0 {
        return Err(format!("duration must not be negative, got {}", duration));
    }
    Ok((pivot, duration))
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let data = if cli.input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(&cli.input)
            .context(format!("Failed to open input file: '{}'", cli.input))?
    };

    if let Some(backup_path) = cli.backup {
        std::fs::write(&backup_path, &data)
            .context(format!("Failed to write backup file: '{}'", backup_path))?;
    }

    let store = SrtStore::deserialize(&data)
        .context(format!("Failed to parse SRT file: '{}'", cli.input))?;
    if store.is_empty() {
        return Err(anyhow!("You appear to have supplied an empty file."));
    }

    let config = EditorConfig::default()
        .with_default_duration(cli.default_duration)
        .with_max_undo_depth(cli.undo_depth);
    let mut subs = SubtitleList::with_config(store, config);

    let opts = processor::ProcessOpts {
        leader_sub: cli.leader_text,
        drop_patterns: cli.drop_patterns,
        shift_forward: cli.shift_forward,
        shift_backward: cli.shift_backward,
        clear_timings: cli.clear_timings,
    };
    processor::process(&mut subs, opts)?;

    if let Some(entry) = subs.first_invalid_timing() {
        log::warn!(
            "subtitle \"{}\" has invalid timing ({:?} --> {:?})",
            entry.content,
            entry.start_time,
            entry.end_time
        );
    }

    let out = subs.serialize();
    if cli.output == "-" {
        io::stdout()
            .write_all(out.as_bytes())
            .context("Failed to write to stdout")?;
    } else {
        std::fs::write(&cli.output, out)
            .context(format!("Failed to write output file: '{}'", cli.output))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_shift_reads_pivot_and_duration() {
        assert_eq!(parse_shift("1500:250"), Ok((1500, 250)));
        assert_eq!(parse_shift(" 0 : 9223372036854775807 "), Ok((0, i64::MAX)));
    }

    #[test]
    fn parse_shift_rejects_bad_values() {
        assert!(parse_shift("1500").is_err());
        assert!(parse_shift("1500:-1").is_err());
        assert!(parse_shift("1500:9223372036854775808").is_err());
    }
}
