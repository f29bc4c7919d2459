use std::path::Path;
use std::time::Duration;

use crossterm::style::{style, Stylize};
use tokio::time;
use tracing_subscriber::EnvFilter;

use mango::cli::{self, ConfigFile};
use mango::config::Config;
use mango::script::{load_script, CancelToken, ErrorKind, ExecError, Interpreter, Script};

#[tokio::main]
async fn main() {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("mango: {e}");
            eprintln!("Usage: mango [-f<rcfile>] [-t<ticks>] [-i<ms>] [-b<steps>] [-dq] [<script>]");
            std::process::exit(2);
        }
    };
    install_tracing(args.debug);

    // ── Load rc file ──────────────────────────────────────────────────────────
    let mut config = match &args.config {
        ConfigFile::Skip => Config::new(),
        ConfigFile::Explicit(path) => load_config(path).await,
        ConfigFile::Search => match cli::find_user_config() {
            Some(path) => load_config(&path).await,
            None => Config::new(),
        },
    };
    if let Some(n) = args.ticks {
        config.ticks = n;
    }
    if let Some(ms) = args.tick_ms {
        config.tick_ms = ms;
    }
    if let Some(n) = args.step_budget {
        config.limits.step_budget = Some(n).filter(|&n| n > 0);
    }

    // ── Load script ───────────────────────────────────────────────────────────
    let src = match tokio::fs::read_to_string(&args.script).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("mango: {}: {e}", args.script.display());
            std::process::exit(1);
        }
    };
    let script = match load_script(&src) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("mango: {}: {e}", args.script.display());
            std::process::exit(1);
        }
    };

    let cancel = CancelToken::new();
    let mut interp = Interpreter::with_std()
        .with_limits(config.limits)
        .with_cancel_token(cancel.clone());
    config.seed(&mut interp);

    let is_tty = unsafe { libc::isatty(libc::STDOUT_FILENO) != 0 };
    let console = Console { color: is_tty };
    console.line(&format!("Script loaded: {} functions.", script.len()));

    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::debug!("interrupt received");
                cancel.cancel();
            }
        }
    });

    // ── Drive start / update ──────────────────────────────────────────────────
    match drive(&script, &mut interp, &config, args.quiet, &console).await {
        Ok(()) => {}
        Err(ExecError::Cancelled) => console.line("Interrupted."),
        Err(e) => {
            console.line(&format!("Stopped: {e}"));
            std::process::exit(1);
        }
    }
}

async fn drive(
    script: &Script,
    interp: &mut Interpreter,
    config: &Config,
    quiet: bool,
    console: &Console,
) -> Result<(), ExecError> {
    let cancel = interp.cancel_token();
    let result = tokio::task::block_in_place(|| script.execute(interp, "start"));
    console.flush(interp);
    result?;

    let mut interval = time::interval(Duration::from_millis(config.tick_ms.max(1)));
    let mut tick = 0u64;
    while config.ticks == 0 || tick < config.ticks {
        interval.tick().await;
        if cancel.is_cancelled() {
            return Err(ExecError::Cancelled);
        }
        let result = tokio::task::block_in_place(|| script.execute(interp, "update"));
        console.flush(interp);
        result?;
        if !quiet {
            console.line(&format!("X = {}", interp.get_variable("x").unwrap_or("")));
        }
        tick += 1;
    }
    Ok(())
}

async fn load_config(path: &Path) -> Config {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(t) => t,
        Err(e) => {
            eprintln!("mango: warning: {}: {e}", path.display());
            return Config::new();
        }
    };
    let (config, errors) = Config::load_str(&text);
    for e in &errors {
        tracing::warn!(path = %path.display(), "rc file: {e}");
    }
    config
}

fn install_tracing(debug: bool) {
    let default = if debug { "mango=debug" } else { "mango=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Prefixed stdout, with error markers highlighted on a terminal.
struct Console {
    color: bool,
}

impl Console {
    fn line(&self, text: &str) {
        if self.color && ErrorKind::from_marker(text).is_some() {
            println!("[Mango] {}", style(text).red());
        } else {
            println!("[Mango] {text}");
        }
    }

    fn flush(&self, interp: &mut Interpreter) {
        for line in interp.take_output() {
            self.line(&line);
        }
    }
}
