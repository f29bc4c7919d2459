//! Command-line argument parsing.
//!
//! Usage:
//!   mango [-f<rcfile>] [-t<ticks>] [-i<ms>] [-b<steps>] [-dq] [<script>]

use std::path::PathBuf;

/// Script run when no path is given.
pub const DEFAULT_SCRIPT: &str = "code.mango";

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug)]
pub struct CliArgs {
    /// Config-file specification.
    pub config: ConfigFile,
    /// Number of `update` ticks (`-t<n>`); overrides the rc file.
    pub ticks: Option<u64>,
    /// Milliseconds between ticks (`-i<ms>`); overrides the rc file.
    pub tick_ms: Option<u64>,
    /// Statement budget per execution (`-b<n>`); overrides the rc file.
    pub step_budget: Option<u64>,
    /// Debug logging (`-d`).
    pub debug: bool,
    /// Do not print `X = …` after each tick (`-q`).
    pub quiet: bool,
    /// Script to load.
    pub script: PathBuf,
}

impl Default for CliArgs {
    fn default() -> Self {
        CliArgs {
            config: ConfigFile::default(),
            ticks: None,
            tick_ms: None,
            step_budget: None,
            debug: false,
            quiet: false,
            script: PathBuf::from(DEFAULT_SCRIPT),
        }
    }
}

/// How to choose the rc file.
#[derive(Debug, Default)]
pub enum ConfigFile {
    /// Search `./.mangorc`, then the user config directory (default).
    #[default]
    Search,
    /// `-f` with no file argument: skip the rc file.
    Skip,
    /// `-f<file>`: load this specific file.
    Explicit(PathBuf),
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(raw.get(1..).unwrap_or_default())
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut positional: Vec<String> = Vec::new();
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();

        // `--` ends flag processing.
        if arg == "--" {
            i += 1;
            positional.extend(argv[i..].iter().cloned());
            break;
        }

        // Non-flag argument.
        if !arg.starts_with('-') || arg == "-" {
            positional.push(arg.to_owned());
            i += 1;
            continue;
        }

        // Flag argument: iterate over characters after the leading `-`.
        let chars: Vec<char> = arg[1..].chars().collect();
        let mut j = 0;
        while j < chars.len() {
            match chars[j] {
                'd' => args.debug = true,
                'q' => args.quiet = true,

                // -f[<file>]
                'f' => {
                    if j + 1 < chars.len() {
                        // Embedded: -f<file>
                        let file: String = chars[j + 1..].iter().collect();
                        args.config = ConfigFile::Explicit(PathBuf::from(file));
                        j = chars.len(); // consumed rest of this arg
                    } else if i + 1 < argv.len() && !argv[i + 1].starts_with('-') && i + 2 < argv.len() {
                        // Separate: -f <file> <script>
                        i += 1;
                        args.config = ConfigFile::Explicit(PathBuf::from(&argv[i]));
                    } else {
                        // -f alone → skip the rc file
                        args.config = ConfigFile::Skip;
                    }
                }

                // -t<n>, -i<ms>, -b<n>
                flag @ ('t' | 'i' | 'b') => {
                    let text = if j + 1 < chars.len() {
                        let s: String = chars[j + 1..].iter().collect();
                        j = chars.len();
                        s
                    } else if i + 1 < argv.len() {
                        i += 1;
                        argv[i].clone()
                    } else {
                        return Err(format!("-{flag} requires a number"));
                    };
                    let n: u64 = text
                        .parse()
                        .map_err(|_| format!("-{flag}: invalid number: {text}"))?;
                    match flag {
                        't' => args.ticks = Some(n),
                        'i' => args.tick_ms = Some(n),
                        _ => args.step_budget = Some(n),
                    }
                }

                c => return Err(format!("unknown option: -{c}")),
            }
            j += 1;
        }
        i += 1;
    }

    match positional.len() {
        0 => {}
        1 => args.script = PathBuf::from(positional.remove(0)),
        n => return Err(format!("too many arguments ({n})")),
    }

    Ok(args)
}

// ── Path helpers ──────────────────────────────────────────────────────────────

/// Search for the rc file in the standard locations.
/// Returns the first path that exists, or `None`.
pub fn find_user_config() -> Option<PathBuf> {
    let mut candidates = vec![PathBuf::from("./.mangorc")];
    if let Some(dirs) = directories::ProjectDirs::from("", "", "mango") {
        candidates.push(dirs.config_dir().join("mangorc"));
    }
    candidates.into_iter().find(|p| p.exists())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
