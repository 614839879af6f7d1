use clap::Parser;
use gameforge::{
    BuildOptions, Cli, ForgeError, GameForge, OutputFormatter, OutputMode, UserFriendlyError,
};
use std::process;

fn main() {
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    // Parse CLI arguments
    let cli = Cli::parse();
    setup_logging(&cli);

    // Handle special commands first
    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let forge = match GameForge::from_cli(&cli) {
        Ok(forge) => forge,
        Err(e) => {
            print_startup_error(&e);
            return exit_code_for(&e);
        }
    };

    let options = BuildOptions {
        dry_run: cli.dry_run,
        require_sections: cli.require_sections,
    };

    let result = cli
        .input_source()
        .and_then(|source| forge.read_response(&source))
        .and_then(|response| forge.build(&response, options));

    match result {
        Ok(report) => {
            forge.output_formatter().print_build_report(&report);
            0
        }
        Err(e) => {
            forge.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn exit_code_for(error: &ForgeError) -> i32 {
    match error {
        ForgeError::InvalidInput { .. } | ForgeError::InvalidWalletAddress { .. } => 2,
        ForgeError::Config { .. } => 3,
        ForgeError::Generation { .. } => 4,
        ForgeError::ResetFailed { .. }
        | ForgeError::WriteFailed { .. }
        | ForgeError::SwapFailed { .. } => 5,
        ForgeError::NothingToWrite { .. } => 6,
        _ => 1, // General error
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "gameforge.toml".to_string());

    match GameForge::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  gameforge <response-file> --config {}", config_path);
            println!("\nEdit the file to customize settings for your needs.");
            0
        }
        Err(e) => {
            eprintln!(
                "Failed to generate configuration file: {}",
                e.user_message()
            );
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn print_startup_error(error: &ForgeError) {
    // Create a basic formatter for startup errors
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}

fn setup_logging(cli: &Cli) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };

    let env = env_logger::Env::default().default_filter_or(format!("gameforge={}", level));
    // A logger may already be installed.
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}
