use clap::{ArgGroup, Parser};
use console::style;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc;

use metaclean::batch::BatchCoordinator;
use metaclean::cleaner::{CleanOptions, Cleaner, resolve_output};
use metaclean::config::{ENV_LOG_LEVEL, Settings};
use metaclean::filter::load_rules;
use metaclean::{logging, ui};

#[derive(Debug, Parser)]
#[command(
    name = "metaclean",
    version,
    about = "Elimina o filtra la metadata de imágenes, documentos y archivos multimedia"
)]
#[command(group(ArgGroup::new("target").required(true).args(["file", "folder"])))]
struct Cli {
    /// Archivo a limpiar.
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Carpeta a limpiar por lotes.
    #[arg(long, value_name = "DIR")]
    folder: Option<PathBuf>,

    /// Ruta de salida (archivo) o carpeta de salida (lotes).
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Archivo JSON con reglas de filtrado para imágenes.
    #[arg(long, value_name = "JSON")]
    config: Option<PathBuf>,

    /// Incluye subcarpetas.
    #[arg(long, requires = "folder")]
    recursive: bool,

    /// Muestra qué se conservaría sin escribir nada.
    #[arg(long)]
    dry_run: bool,

    /// Elimina por completo las coordenadas GPS.
    #[arg(long)]
    remove_gps: bool,

    /// Conserva las marcas de tiempo exactas.
    #[arg(long)]
    keep_timestamp: bool,

    /// Guarda un respaldo `<archivo>.metadata.bak` antes de limpiar.
    #[arg(long)]
    backup: bool,

    /// Reinserta los campos de un respaldo en una copia del archivo.
    #[arg(long, value_name = "BACKUP", requires = "file", conflicts_with_all = ["dry_run", "backup"])]
    restore: Option<PathBuf>,

    /// Máximo de hilos para lotes.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    workers: Option<u16>,

    /// Nivel de log cuando RUST_LOG no está definido.
    #[arg(long, value_name = "LEVEL", env = ENV_LOG_LEVEL)]
    log_level: Option<String>,

    /// Escribe un reporte CSV del lote.
    #[arg(long, value_name = "CSV", requires = "folder")]
    report: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (mut settings, rejected) = Settings::load_from_env();
    if let Some(level) = &cli.log_level {
        settings.log_level = level.trim().to_ascii_lowercase();
    }
    if let Some(workers) = cli.workers {
        settings.workers = usize::from(workers);
    }
    logging::init(&settings.log_level);
    rejected.iter().for_each(|setting| setting.log());

    ui::render_header();

    let rules = load_rules(cli.config.as_deref()).with_overrides(cli.remove_gps, cli.keep_timestamp);
    let options = CleanOptions {
        rules: Some(rules),
        dry_run: cli.dry_run,
        backup: cli.backup,
    };

    let succeeded = match (&cli.file, &cli.folder) {
        (Some(file), _) => run_file(&cli, &settings, file, &options),
        (None, Some(folder)) => run_folder(&cli, &settings, folder, &options),
        (None, None) => false,
    };

    if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn run_file(cli: &Cli, settings: &Settings, file: &Path, options: &CleanOptions) -> bool {
    let cleaner = Cleaner::from_settings(settings);
    let output = resolve_output(file, cli.output.as_deref());

    let report = match &cli.restore {
        Some(backup) => match cleaner.restore(file, backup, &output) {
            Ok(report) => report,
            Err(error) => {
                eprintln!("{} {error}", style("Error:").red().bold());
                return false;
            }
        },
        None => cleaner.clean_file(file, &output, options),
    };

    ui::render_file_report(&report);
    report.is_success()
}

fn run_folder(cli: &Cli, settings: &Settings, folder: &Path, options: &CleanOptions) -> bool {
    let coordinator = BatchCoordinator::from_settings(settings);
    let output_dir = cli.output.clone().or_else(|| settings.output_dir.clone());

    let (tx, rx) = mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            ui::render_batch_event(&event);
        }
    });

    let result = coordinator.process_folder_with(
        folder,
        output_dir.as_deref(),
        cli.recursive,
        options,
        Some(tx),
    );
    let _ = printer.join();

    let report = match result {
        Ok(report) => report,
        Err(error) => {
            eprintln!("{} {error}", style("Error:").red().bold());
            return false;
        }
    };

    ui::render_batch_report(&report);

    if let Some(path) = &cli.report {
        match report.write_csv(path) {
            Ok(()) => println!("{}", style(format!("Reporte escrito en {}", path.display())).dim()),
            Err(error) => {
                eprintln!("{} {error}", style("Error:").red().bold());
                return false;
            }
        }
    }

    report.is_clean()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn a_target_is_required() {
        assert!(Cli::try_parse_from(["metaclean", "--dry-run"]).is_err());
        assert!(Cli::try_parse_from(["metaclean", "--file", "a.jpg", "--folder", "fotos"]).is_err());
    }

    #[test]
    fn restore_needs_a_single_file() {
        assert!(Cli::try_parse_from(["metaclean", "--folder", "fotos", "--restore", "a.bak"]).is_err());
        let cli = Cli::try_parse_from(["metaclean", "--file", "a.jpg", "--restore", "a.jpg.metadata.bak"])
            .map_err(|error| error.to_string());
        assert!(cli.is_ok_and(|cli| cli.restore.is_some()));
    }

    #[test]
    fn zero_workers_is_rejected() {
        assert!(Cli::try_parse_from(["metaclean", "--folder", "fotos", "--workers", "0"]).is_err());
    }
}
