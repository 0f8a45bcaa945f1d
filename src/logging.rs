//! Inicialización del suscriptor de `tracing`.

use tracing_subscriber::EnvFilter;

/// Instala el suscriptor global. `RUST_LOG` tiene prioridad sobre `level`.
///
/// Llamarla más de una vez no tiene efecto.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("metaclean={level}")))
        .unwrap_or_else(|_| EnvFilter::new("metaclean=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
