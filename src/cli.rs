//! Command-line parsing for the `foldrun` binary.

use std::path::PathBuf;

use crate::config::MirrorKind;

/// Parsed command line for a batch run. Optional fields left as `None` fall
/// through to the config file and then to built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub input: PathBuf,
    pub archive: PathBuf,
    pub config: Option<PathBuf>,
    pub scratch: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub search_bin: Option<PathBuf>,
    pub predict_bin: Option<PathBuf>,
    pub db_tool_bin: Option<PathBuf>,
    pub threads: Option<u32>,
    pub gpu: Option<u32>,
    pub model_type: Option<String>,
    pub num_models: Option<u32>,
    pub num_recycle: Option<u32>,
    pub pair_mode: Option<String>,
    pub pair_strategy: Option<String>,
    /// Last of `--templates` / `--no-templates` wins.
    pub templates: Option<bool>,
    pub mirror: Option<MirrorKind>,
    pub log_dir: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub stop_on_error: bool,
    pub dry_run: bool,
}

impl CliArgs {
    /// Arguments with only the required paths set.
    pub fn new(input: PathBuf, archive: PathBuf) -> Self {
        Self {
            input,
            archive,
            config: None,
            scratch: None,
            database: None,
            search_bin: None,
            predict_bin: None,
            db_tool_bin: None,
            threads: None,
            gpu: None,
            model_type: None,
            num_models: None,
            num_recycle: None,
            pair_mode: None,
            pair_strategy: None,
            templates: None,
            mirror: None,
            log_dir: None,
            report: None,
            stop_on_error: false,
            dry_run: false,
        }
    }
}

/// What the operator asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Run(Box<CliArgs>),
    Help,
}

/// Parse arguments (without the program name).
///
/// Errors carry a short message; the caller prints it together with the
/// usage text and exits with a usage status.
pub fn parse_args(args: &[String]) -> Result<CliCommand, String> {
    if args.iter().any(|a| a == "-h" || a == "--help") {
        return Ok(CliCommand::Help);
    }

    let mut input = None;
    let mut archive = None;
    let mut parsed = CliArgs::new(PathBuf::new(), PathBuf::new());

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => input = Some(PathBuf::from(next_value(args, &mut i, "--input")?)),
            "--archive" => archive = Some(PathBuf::from(next_value(args, &mut i, "--archive")?)),
            "--config" => {
                parsed.config = Some(PathBuf::from(next_value(args, &mut i, "--config")?));
            }
            "--scratch" => {
                parsed.scratch = Some(PathBuf::from(next_value(args, &mut i, "--scratch")?));
            }
            "--database" => {
                parsed.database = Some(PathBuf::from(next_value(args, &mut i, "--database")?));
            }
            "--search-bin" => {
                parsed.search_bin = Some(PathBuf::from(next_value(args, &mut i, "--search-bin")?));
            }
            "--predict-bin" => {
                parsed.predict_bin =
                    Some(PathBuf::from(next_value(args, &mut i, "--predict-bin")?));
            }
            "--db-tool-bin" => {
                parsed.db_tool_bin =
                    Some(PathBuf::from(next_value(args, &mut i, "--db-tool-bin")?));
            }
            "--threads" => {
                let value = next_value(args, &mut i, "--threads")?;
                let threads = parse_u32("--threads", &value)?;
                if threads == 0 {
                    return Err("--threads must be >= 1".to_string());
                }
                parsed.threads = Some(threads);
            }
            "--gpu" => {
                let value = next_value(args, &mut i, "--gpu")?;
                parsed.gpu = Some(parse_u32("--gpu", &value)?);
            }
            "--model-type" => parsed.model_type = Some(next_value(args, &mut i, "--model-type")?),
            "--num-models" => {
                let value = next_value(args, &mut i, "--num-models")?;
                let models = parse_u32("--num-models", &value)?;
                if models == 0 {
                    return Err("--num-models must be >= 1".to_string());
                }
                parsed.num_models = Some(models);
            }
            "--num-recycle" => {
                let value = next_value(args, &mut i, "--num-recycle")?;
                parsed.num_recycle = Some(parse_u32("--num-recycle", &value)?);
            }
            "--pair-mode" => parsed.pair_mode = Some(next_value(args, &mut i, "--pair-mode")?),
            "--pair-strategy" => {
                parsed.pair_strategy = Some(next_value(args, &mut i, "--pair-strategy")?);
            }
            "--templates" => parsed.templates = Some(true),
            "--no-templates" => parsed.templates = Some(false),
            "--mirror" => {
                let value = next_value(args, &mut i, "--mirror")?;
                parsed.mirror = Some(value.parse::<MirrorKind>()?);
            }
            "--log-dir" => {
                parsed.log_dir = Some(PathBuf::from(next_value(args, &mut i, "--log-dir")?));
            }
            "--report" => {
                parsed.report = Some(PathBuf::from(next_value(args, &mut i, "--report")?));
            }
            "--stop-on-error" => parsed.stop_on_error = true,
            "--dry-run" => parsed.dry_run = true,
            unknown if unknown.starts_with('-') => {
                return Err(format!("unknown flag: {unknown}"));
            }
            other => return Err(format!("unexpected argument: {other}")),
        }
        i += 1;
    }

    parsed.input = input.ok_or_else(|| "missing required flag: --input".to_string())?;
    parsed.archive = archive.ok_or_else(|| "missing required flag: --archive".to_string())?;
    Ok(CliCommand::Run(Box::new(parsed)))
}

fn next_value(args: &[String], i: &mut usize, flag: &str) -> Result<String, String> {
    let next = args
        .get(*i + 1)
        .ok_or_else(|| format!("missing value for {flag}"))?;
    if next.starts_with("--") {
        return Err(format!("missing value for {flag}"));
    }
    *i += 1;
    Ok(next.clone())
}

fn parse_u32(flag: &str, value: &str) -> Result<u32, String> {
    value
        .parse::<u32>()
        .map_err(|_| format!("{flag} must be a non-negative integer, got '{value}'"))
}

/// Usage text printed for `--help` and after argument errors.
pub fn help_text(exe: &str) -> String {
    format!(
        "Usage: {exe} --input <PATH> --archive <PATH> [options]\n\n\
Runs sequence search and structure prediction for each input file, then moves\n\
results from scratch into the archive. Completed units are skipped on rerun.\n\n\
Required:\n\
  --input <PATH>            Sequence file or directory (.fasta .fa .faa .fas .a3m)\n\
  --archive <PATH>          Archive root for durable results\n\n\
Options:\n\
  --scratch <PATH>          Scratch root (default: <tmp>/foldrun)\n\
  --database <PATH>         Sequence database directory\n\
  --search-bin <PATH>       Search tool executable (default: colabfold_search)\n\
  --predict-bin <PATH>      Predict tool executable (default: colabfold_batch)\n\
  --db-tool-bin <PATH>      Database tool passed to the search tool (default: mmseqs)\n\
  --threads <N>             Search threads (default: 8)\n\
  --gpu <ID>                Accelerator id (default: 0)\n\
  --model-type <NAME>       Model family (default: alphafold2_multimer_v3)\n\
  --num-models <N>          Replica count (default: 5)\n\
  --num-recycle <N>         Recycle count (default: 3)\n\
  --pair-mode <MODE>        Pairing mode (default: unpaired_paired)\n\
  --pair-strategy <NAME>    Pairing strategy (default: greedy)\n\
  --templates               Use templates\n\
  --no-templates            Do not use templates (default)\n\
  --mirror <copy|rsync>     Directory archival method (default: copy)\n\
  --config <PATH>           Config file (default: <config dir>/.foldrun/foldrun.toml)\n\
  --log-dir <PATH>          Run log directory\n\
  --report <PATH>           Write a JSON run report\n\
  --stop-on-error           Stop after the first failed unit\n\
  --dry-run                 Show the plan without running tools\n\
  -h, --help                Show help\n"
    )
}
