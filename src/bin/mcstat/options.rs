use std::collections::BTreeMap;
use std::path::PathBuf;

use mcstat::montecarlo::{StepSelector, XKind};

#[derive(Clone, Debug, PartialEq)]
pub(super) enum Command {
    Summarize {
        run_data: PathBuf,
    },
    MonteCarlo {
        run_data: PathBuf,
    },
    Plot {
        dir: PathBuf,
        suffix: Option<String>,
        key: Option<String>,
    },
    Compare {
        label: String,
        x_kind: XKind,
        x: Vec<String>,
        paths: Vec<PathBuf>,
        key: String,
        step: StepSelector,
        out: PathBuf,
        stats_dir: Option<PathBuf>,
    },
    Confusion {
        pairs: PathBuf,
        name: Option<String>,
        out: Option<PathBuf>,
        plot_dir: Option<PathBuf>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub(super) struct CliOptions {
    pub(super) command: Command,
    pub(super) config: Option<PathBuf>,
    pub(super) formats: Option<Vec<String>>,
    pub(super) plotly_js: Option<PathBuf>,
    pub(super) open: bool,
}

const COMMON_FLAGS: [&str; 3] = ["--config", "--format", "--plotly-js"];

/// `None` when help was requested and printed.
pub(super) fn parse_args(args: Vec<String>) -> Result<Option<CliOptions>, String> {
    let Some((name, rest)) = args.split_first() else {
        return Err(format!("Missing command\n\n{}", help_text()));
    };
    if name == "-h" || name == "--help" {
        println!("{}", help_text());
        return Ok(None);
    }
    let allowed: &[&str] = match name.as_str() {
        "summarize" | "montecarlo" => &["--run-data"],
        "plot" => &["--dir", "--suffix", "--key"],
        "compare" => &[
            "--label",
            "--x-kind",
            "--x",
            "--paths",
            "--key",
            "--step",
            "--out",
            "--stats-dir",
        ],
        "confusion" => &["--pairs", "--name", "--out", "--plot-dir"],
        other => return Err(format!("Unknown command: {other}\n\n{}", help_text())),
    };
    let Some(mut flags) = collect_flags(rest, allowed)? else {
        return Ok(None);
    };
    let command = match name.as_str() {
        "summarize" => Command::Summarize {
            run_data: PathBuf::from(flags.required("--run-data")?),
        },
        "montecarlo" => Command::MonteCarlo {
            run_data: PathBuf::from(flags.required("--run-data")?),
        },
        "plot" => Command::Plot {
            dir: PathBuf::from(flags.required("--dir")?),
            suffix: flags.optional("--suffix"),
            key: flags.optional("--key"),
        },
        "compare" => Command::Compare {
            label: flags.required("--label")?,
            x_kind: flags.optional("--x-kind").map_or(Ok(XKind::Label), |kind| kind.parse())?,
            x: split_list(&flags.required("--x")?),
            paths: split_list(&flags.required("--paths")?)
                .into_iter()
                .map(PathBuf::from)
                .collect(),
            key: flags.optional("--key").unwrap_or_else(|| "test accuracy".to_string()),
            step: flags
                .optional("--step")
                .map_or(Ok(StepSelector::Final), |step| step.parse())?,
            out: PathBuf::from(flags.required("--out")?),
            stats_dir: flags.optional("--stats-dir").map(PathBuf::from),
        },
        _ => Command::Confusion {
            pairs: PathBuf::from(flags.required("--pairs")?),
            name: flags.optional("--name"),
            out: flags.optional("--out").map(PathBuf::from),
            plot_dir: flags.optional("--plot-dir").map(PathBuf::from),
        },
    };
    Ok(Some(CliOptions {
        command,
        config: flags.optional("--config").map(PathBuf::from),
        formats: flags.optional("--format").map(|formats| split_list(&formats)),
        plotly_js: flags.optional("--plotly-js").map(PathBuf::from),
        open: flags.open,
    }))
}

struct Flags {
    values: BTreeMap<&'static str, String>,
    open: bool,
}

impl Flags {
    fn optional(&mut self, flag: &str) -> Option<String> {
        self.values.remove(flag)
    }

    fn required(&mut self, flag: &str) -> Result<String, String> {
        self.optional(flag)
            .ok_or_else(|| format!("{flag} is required\n\n{}", help_text()))
    }
}

fn collect_flags(args: &[String], allowed: &[&'static str]) -> Result<Option<Flags>, String> {
    let mut flags = Flags {
        values: BTreeMap::new(),
        open: false,
    };
    let mut idx = 0usize;
    while idx < args.len() {
        let flag = args[idx].as_str();
        match flag {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "--open" => flags.open = true,
            _ => {
                let Some(known) = allowed
                    .iter()
                    .chain(COMMON_FLAGS.iter())
                    .copied()
                    .find(|known| *known == flag)
                else {
                    return Err(format!("Unknown argument: {flag}\n\n{}", help_text()));
                };
                let value = value_after(args, &mut idx, flag)?;
                flags.values.insert(known, value.to_string());
            }
        }
        idx += 1;
    }
    Ok(Some(flags))
}

fn value_after<'a>(args: &'a [String], idx: &mut usize, flag: &str) -> Result<&'a str, String> {
    *idx += 1;
    let value = args.get(*idx).ok_or_else(|| format!("{flag} requires a value"))?;
    Ok(value)
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn help_text() -> &'static str {
    "Usage: mcstat <command> [options]\n\n\
Commands:\n\
  summarize --run-data <file>     Write per-network statistics next to the run data\n\
  montecarlo --run-data <file>    Statistics files and every Monte Carlo chart\n\
  plot --dir <dir> [--suffix <s>] [--key <k>]\n\
                                  Loss/accuracy lines of the fit results in a directory\n\
  compare --label <s> --x <a,b> --paths <p,q> --out <file>\n\
          [--x-kind int|float|label] [--key <k>] [--step <n|final>] [--stats-dir <dir>]\n\
                                  Box plot (and statistics) across several Monte Carlo runs\n\
  confusion --pairs <csv> [--name <s>] [--out <csv>] [--plot-dir <dir>]\n\
                                  Confusion matrix of predicted,actual label pairs\n\n\
Options:\n\
  --config <path>                 Settings file (default: mcstat.toml in the app directory)\n\
  --format <html,svg>             Chart formats to write (default: from settings)\n\
  --plotly-js <path>              Embed this plotly.js bundle so HTML charts open offline\n\
  --open                          Open the HTML charts after writing them\n\
  -h, --help                      Show this help\n"
}
