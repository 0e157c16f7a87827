use clap::Parser;
use inspection_loader::{
    logging, Cli, IngestError, InspectionLoader, OutputFormat, OutputFormatter, OutputMode,
    RunReport, UserFriendlyError,
};
use std::path::PathBuf;
use std::process;

const DEFAULT_CONFIG_FILE: &str = "inspection-loader.toml";

fn main() {
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    let cli = Cli::parse();

    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    // A second subscriber cannot be installed; the run goes on without it.
    if let Err(e) = logging::init_logging(
        cli.verbosity_level(),
        cli.quiet,
        cli.output_format == OutputFormat::Json,
    ) {
        eprintln!("{}", e);
    }

    let loader = match InspectionLoader::from_cli(&cli) {
        Ok(loader) => loader,
        Err(e) => {
            print_startup_error(&cli, &e);
            return exit_code_for(&e);
        }
    };

    let directories = cli.target_directories(loader.config());
    if cli.all {
        for path in loader.config().sources.unsupported_warehouses() {
            loader.output_formatter().warning(&format!(
                "Skipping {}: the NITTSU MATHIAS layout is not supported",
                path.display()
            ));
        }
    }
    if directories.is_empty() {
        let e = IngestError::Config {
            message: "no warehouse directories configured (set NITTSU_PATH, KOBE_PATH or HAKATA_PATH)"
                .to_string(),
        };
        loader.handle_error(&e);
        return exit_code_for(&e);
    }

    if cli.list {
        return handle_list(&loader, &directories);
    }

    let mut report = match loader.process_directories(&directories, cli.extraction_mode()) {
        Ok(report) => report,
        Err(e) => {
            loader.handle_error(&e);
            return exit_code_for(&e);
        }
    };

    if cli.upload && report.succeeded() > 0 {
        if let Err(e) = loader.upload(&mut report) {
            loader.output_formatter().print_run_report(&report);
            loader.handle_error(&e);
            return exit_code_for(&e);
        }
    }

    loader.output_formatter().print_run_report(&report);

    if report.succeeded() == 0 {
        if let Some(e) = report.first_error() {
            loader.handle_error(e);
        }
    }

    exit_code_for_report(&report)
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    match InspectionLoader::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path.display());
            println!("\nTo use this configuration:");
            println!(
                "  inspection-loader <directory> --config {}",
                config_path.display()
            );
            println!("\nWarehouse paths and thresholds can also be set in a .env file.");
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn handle_list(loader: &InspectionLoader, directories: &[PathBuf]) -> i32 {
    let formatter = loader.output_formatter();
    let mut errors = Vec::new();

    for directory in directories {
        match loader.list(directory) {
            Ok(listing) => formatter.print_listing(&listing),
            Err(e) => {
                loader.handle_error(&e);
                errors.push(e);
            }
        }
    }

    match errors.first() {
        None => 0,
        Some(_) if errors.len() < directories.len() => 2,
        Some(e) => exit_code_for(e),
    }
}

fn print_startup_error(cli: &Cli, error: &IngestError) {
    let formatter = OutputFormatter::new(OutputMode::from(cli.output_format), 0, false);
    formatter.print_user_friendly_error(error);
}

fn exit_code_for(error: &IngestError) -> i32 {
    match error {
        IngestError::NotFound { .. } | IngestError::NotADirectory { .. } => 3,
        IngestError::EmptyInput { .. } => 4,
        IngestError::UnsupportedVariant { .. } => 5,
        IngestError::Config { .. } => 6,
        IngestError::Cancelled => 130, // Interrupted (SIGINT)
        _ => 1,
    }
}

fn exit_code_for_report(report: &RunReport) -> i32 {
    if report.succeeded() == 0 {
        return report.first_error().map(exit_code_for).unwrap_or(1);
    }
    if report.is_partial() {
        2
    } else {
        0
    }
}
