use {
    anyhow::Result,
    clap::Subcommand,
    notifeed_config::{NotifeedConfig, Severity, validate},
};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Validate the effective configuration and report errors/warnings.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
    /// Print the effective configuration as TOML (token redacted).
    Show,
}

pub fn handle_config(action: ConfigAction, config: &NotifeedConfig) -> Result<()> {
    match action {
        ConfigAction::Check { verbose } => check(config, verbose),
        ConfigAction::Show => show(config),
    }
}

const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn check(config: &NotifeedConfig, verbose: bool) -> Result<()> {
    let result = validate(config);

    let mut shown = 0;
    for d in &result.diagnostics {
        if d.severity == Severity::Info && !verbose {
            continue;
        }
        let color = match d.severity {
            Severity::Error => RED,
            Severity::Warning => YELLOW,
            Severity::Info => CYAN,
        };
        eprintln!("  {BOLD}{color}{}{RESET} {}: {}", d.severity, d.path, d.message);
        shown += 1;
    }
    if shown > 0 {
        eprintln!();
    }

    let errors = result.of(Severity::Error).count();
    let warnings = result.of(Severity::Warning).count();
    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn show(config: &NotifeedConfig) -> Result<()> {
    let mut redacted = config.clone();
    if redacted.github.token.is_some() {
        redacted.github.token = Some(secrecy::Secret::new("<redacted>".into()));
    }
    println!("{}", toml::to_string_pretty(&redacted)?);
    Ok(())
}
