use std::path::PathBuf;

use quest_engine::LoopConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_MAX_TICKS: u64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RunOptions {
    pub(crate) script: Option<PathBuf>,
    /// 0 runs until quit or an empty stack.
    pub(crate) max_ticks: u64,
    pub(crate) fresh: bool,
    pub(crate) save: bool,
    pub(crate) realtime: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            script: None,
            max_ticks: DEFAULT_MAX_TICKS,
            fresh: false,
            save: true,
            realtime: false,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Run(RunOptions),
    Help,
}

pub(crate) struct AppWiring {
    pub(crate) options: RunOptions,
    pub(crate) config: LoopConfig,
}

pub(crate) fn build_app(options: RunOptions) -> AppWiring {
    init_tracing();
    info!("=== CareerQuest Startup ===");

    let config = LoopConfig {
        max_ticks: (options.max_ticks > 0).then_some(options.max_ticks),
        realtime: options.realtime,
        ..LoopConfig::default()
    };

    AppWiring { options, config }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

pub(crate) fn parse_args(args: &[String]) -> Result<Command, String> {
    let mut options = RunOptions::default();
    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--script" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| "missing value for --script".to_string())?;
                options.script = Some(PathBuf::from(value));
                index += 2;
            }
            "--max-ticks" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| "missing value for --max-ticks".to_string())?;
                options.max_ticks = value
                    .parse::<u64>()
                    .map_err(|_| format!("invalid --max-ticks value '{value}' (expected u64)"))?;
                index += 2;
            }
            "--fresh" => {
                options.fresh = true;
                index += 1;
            }
            "--no-save" => {
                options.save = false;
                index += 1;
            }
            "--realtime" => {
                options.realtime = true;
                index += 1;
            }
            other => return Err(format!("unknown argument '{other}'\n\n{}", usage_text())),
        }
    }
    Ok(Command::Run(options))
}

pub(crate) fn usage_text() -> String {
    [
        "careerquest - headless CareerQuest runtime",
        "",
        "Usage:",
        "  careerquest [--script <file>] [--max-ticks <u64>] [--fresh] [--no-save] [--realtime]",
        "",
        "Options:",
        "  --script <file>    replay input segments from a JSON script",
        "  --max-ticks <u64>  stop after this many ticks, 0 for no limit",
        "  --fresh            ignore the existing save file",
        "  --no-save          do not write progress on exit",
        "  --realtime         pace ticks against the wall clock",
        "",
        "Defaults:",
        "  --max-ticks 3600",
    ]
    .join("\n")
}
