//! Presentación en terminal de los resultados de limpieza.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Row, Table};
use console::style;

use crate::batch::{BatchEvent, BatchReport};
use crate::cleaner::FileReport;
use crate::dispatcher::Dispatch;
use crate::formatting::{file_size_label, format_field_value};
use crate::metadata::MetadataMap;

const HEADER_WIDTH: usize = 66;

pub fn render_header() {
    let border = "═".repeat(HEADER_WIDTH - 2);
    println!("{}", style(format!("╔{border}╗")).cyan().bold());
    println!(
        "{}",
        style(format!(
            "║ {:^inner_width$} ║",
            "metaclean | Limpieza de metadata",
            inner_width = HEADER_WIDTH - 4
        ))
        .cyan()
        .bold()
    );
    println!("{}\n", style(format!("╚{border}╝")).cyan().bold());
}

fn build_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(headers.iter().map(|text| header_cell(text)).collect::<Vec<_>>());

    table
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
        .add_attribute(Attribute::Underlined)
}

fn label_cell(label: &str) -> Cell {
    Cell::new(label).fg(Color::Rgb {
        r: 160,
        g: 196,
        b: 255,
    })
}

fn build_row(label: &str, value: &str, value_color: Color) -> Row {
    Row::from(vec![label_cell(label), Cell::new(value).fg(value_color)])
}

fn status_cell(report: &FileReport) -> Cell {
    match &report.outcome {
        Dispatch::Success(_) if report.dry_run => Cell::new("Simulado").fg(Color::Yellow),
        Dispatch::Success(_) => Cell::new("Limpio").fg(Color::Green),
        Dispatch::SoftFailure(_) => Cell::new("Falló").fg(Color::Red),
        Dispatch::HardFailure(error) => Cell::new(error.label()).fg(Color::Red),
    }
}

/// Tabla de propiedades para un único archivo.
pub fn file_report_table(report: &FileReport) -> Table {
    let mut table = build_table(&["Propiedad", "Valor"]);
    table.add_row(build_row("Archivo", &report.source.display().to_string(), Color::White));
    table.add_row(Row::from(vec![label_cell("Estado"), status_cell(report)]));

    if let Some(output) = report.output() {
        let label = if report.dry_run { "Salida prevista" } else { "Salida" };
        table.add_row(build_row(label, &output.display().to_string(), Color::White));
        if !report.dry_run {
            table.add_row(build_row("Tamaño", &file_size_label(output), Color::White));
        }
    }
    if let Some(count) = report.fields_before {
        table.add_row(build_row("Campos encontrados", &count.to_string(), Color::White));
    }
    if let Some(backup) = &report.backup {
        table.add_row(build_row("Respaldo", &backup.display().to_string(), Color::White));
    }
    for attempt in report.outcome.attempts() {
        table.add_row(build_row(
            &format!("Intento {}", attempt.adapter),
            &attempt.error,
            Color::Yellow,
        ));
    }
    if let Dispatch::HardFailure(error) = &report.outcome {
        table.add_row(build_row("Motivo", &error.to_string(), Color::Red));
    }
    table
}

/// Campos que sobrevivirían a la limpieza.
pub fn planned_fields_table(fields: &MetadataMap) -> Table {
    let mut table = build_table(&["Campo", "Tipo", "Valor conservado"]);
    for (key, value) in fields.iter() {
        table.add_row(Row::from(vec![
            label_cell(&key.to_string()),
            Cell::new(value.type_name()).fg(Color::DarkGrey),
            Cell::new(format_field_value(value)).fg(Color::White),
        ]));
    }
    table
}

pub fn batch_table(report: &BatchReport) -> Table {
    let mut table = build_table(&["Archivo", "Estado", "Detalle"]);
    for file in report.succeeded.iter().chain(report.failed.iter()) {
        let detail = match file.output() {
            Some(output) => output.display().to_string(),
            None => file.outcome.failure_reason().unwrap_or_default(),
        };
        table.add_row(Row::from(vec![
            label_cell(&file.source.display().to_string()),
            status_cell(file),
            Cell::new(detail),
        ]));
    }
    table
}

pub fn render_file_report(report: &FileReport) {
    println!("\n{}", file_report_table(report));
    if let Some(planned) = &report.planned {
        if planned.is_empty() {
            println!("{}", style("No se conservaría ningún campo.").dim());
        } else {
            println!("{}", planned_fields_table(planned));
        }
    }
}

pub fn render_batch_report(report: &BatchReport) {
    println!("\n{}", batch_table(report));
    let summary = format!(
        "{} limpios, {} con error, salida en {}",
        report.succeeded.len(),
        report.failed.len(),
        report.output_dir.display()
    );
    if report.failed.is_empty() {
        println!("{}", style(summary).green().bold());
    } else {
        println!("{}", style(summary).yellow().bold());
    }
    if report.stopped {
        println!("{}", style("El lote se detuvo antes de terminar.").red());
    }
}

/// Línea de progreso para los eventos de un lote.
pub fn render_batch_event(event: &BatchEvent) {
    match event {
        BatchEvent::Started { total } => {
            println!("{}", style(format!("Procesando {total} archivos…")).dim())
        }
        BatchEvent::Processing { index, total, path } => println!(
            "{} {}",
            style(format!("[{index}/{total}]")).cyan(),
            path.display()
        ),
        BatchEvent::Success { .. } | BatchEvent::Finished { .. } => {}
        BatchEvent::Failure { path, error } => eprintln!(
            "{} {}: {error}",
            style("✗").red().bold(),
            path.display()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::AdapterAttempt;
    use crate::error::ValidationError;
    use crate::metadata::{FieldKey, FieldValue};
    use std::path::PathBuf;

    fn report(outcome: crate::dispatcher::DispatchOutcome) -> FileReport {
        FileReport {
            source: PathBuf::from("foto.jpg"),
            outcome,
            fields_before: Some(3),
            planned: None,
            backup: None,
            dry_run: false,
        }
    }

    #[test]
    fn failed_report_lists_attempts() {
        let table = file_report_table(&report(Dispatch::SoftFailure(vec![AdapterAttempt {
            adapter: "exiftool",
            error: "estado 1".to_string(),
        }])));
        let text = table.to_string();
        assert!(text.contains("Intento exiftool"));
        assert!(text.contains("estado 1"));
    }

    #[test]
    fn hard_failure_shows_its_label() {
        let table = file_report_table(&report(Dispatch::HardFailure(ValidationError::Empty(
            PathBuf::from("foto.jpg"),
        ))));
        assert!(table.to_string().contains("archivo vacío"));
    }

    #[test]
    fn planned_fields_render_one_row_each() {
        let mut fields = MetadataMap::new();
        fields.insert(FieldKey::name("IFD0:Make"), FieldValue::text("Canon"));
        fields.insert(FieldKey::name("IFD0:Model"), FieldValue::text("EOS"));
        let table = planned_fields_table(&fields);
        assert_eq!(table.row_count(), 2);
        assert!(table.to_string().contains("Canon"));
    }
}
