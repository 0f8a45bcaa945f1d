//! Ajustes de ejecución leídos desde variables de entorno.

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const ENV_LOG_LEVEL: &str = "METACLEAN_LOG_LEVEL";
pub const ENV_OUTPUT_DIR: &str = "METACLEAN_OUTPUT_DIR";
pub const ENV_WORKERS: &str = "METACLEAN_WORKERS";
pub const ENV_PARALLEL: &str = "METACLEAN_PARALLEL";
pub const ENV_TOOL_TIMEOUT: &str = "METACLEAN_TOOL_TIMEOUT_SECS";

const DEFAULT_WORKERS: usize = 4;
const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 60;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub log_level: String,
    pub output_dir: Option<PathBuf>,
    pub workers: usize,
    pub parallel: bool,
    pub tool_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            output_dir: None,
            workers: DEFAULT_WORKERS,
            parallel: true,
            tool_timeout: Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS),
        }
    }
}

/// Variable con un valor que no se pudo interpretar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedSetting {
    pub variable: &'static str,
    pub value: String,
}

impl RejectedSetting {
    pub fn log(&self) {
        warn!(variable = self.variable, valor = %self.value, "Valor inválido, se usa el predeterminado");
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Construye los ajustes a partir de una función de búsqueda arbitraria.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let (settings, rejected) = Self::load_with(lookup);
        rejected.iter().for_each(RejectedSetting::log);
        settings
    }

    /// Como [`Settings::from_env`], pero sin registrar nada: los valores
    /// rechazados se devuelven para emitirlos una vez iniciado el logging.
    pub fn load_from_env() -> (Self, Vec<RejectedSetting>) {
        Self::load_with(|key| env::var(key).ok())
    }

    pub fn load_with<F>(lookup: F) -> (Self, Vec<RejectedSetting>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();
        let mut rejected = Vec::new();
        let mut reject = |variable: &'static str, value: String| {
            rejected.push(RejectedSetting { variable, value });
        };

        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
            settings.log_level = level.trim().to_ascii_lowercase();
        }

        if let Some(dir) = lookup(ENV_OUTPUT_DIR).filter(|v| !v.trim().is_empty()) {
            settings.output_dir = Some(PathBuf::from(dir));
        }

        if let Some(raw) = lookup(ENV_WORKERS) {
            match raw.trim().parse::<usize>() {
                Ok(workers) if workers > 0 => settings.workers = workers,
                _ => reject(ENV_WORKERS, raw),
            }
        }

        if let Some(raw) = lookup(ENV_PARALLEL) {
            match parse_flag(&raw) {
                Some(flag) => settings.parallel = flag,
                None => reject(ENV_PARALLEL, raw),
            }
        }

        if let Some(raw) = lookup(ENV_TOOL_TIMEOUT) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => settings.tool_timeout = Duration::from_secs(secs),
                _ => reject(ENV_TOOL_TIMEOUT, raw),
            }
        }

        (settings, rejected)
    }

    /// Tamaño real del grupo de hilos: nunca mayor que el paralelismo disponible.
    pub fn effective_workers(&self) -> usize {
        if !self.parallel {
            return 1;
        }
        let available = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        self.workers.clamp(1, available.max(1))
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "si" | "sí" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let settings = Settings::from_lookup(|_| None);
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.tool_timeout, Duration::from_secs(60));
    }

    #[test]
    fn reads_every_variable() {
        let settings = Settings::from_lookup(lookup_from(&[
            (ENV_LOG_LEVEL, "DEBUG"),
            (ENV_OUTPUT_DIR, "/tmp/limpios"),
            (ENV_WORKERS, "8"),
            (ENV_PARALLEL, "no"),
            (ENV_TOOL_TIMEOUT, "5"),
        ]));

        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.output_dir, Some(PathBuf::from("/tmp/limpios")));
        assert_eq!(settings.workers, 8);
        assert!(!settings.parallel);
        assert_eq!(settings.tool_timeout, Duration::from_secs(5));
        assert_eq!(settings.effective_workers(), 1);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let settings = Settings::from_lookup(lookup_from(&[
            (ENV_WORKERS, "cero"),
            (ENV_PARALLEL, "quizás"),
            (ENV_TOOL_TIMEOUT, "0"),
        ]));
        assert_eq!(settings.workers, DEFAULT_WORKERS);
        assert!(settings.parallel);
        assert_eq!(settings.tool_timeout, Duration::from_secs(60));
    }

    #[test]
    fn rejected_values_are_returned_until_logging_is_ready() {
        let (settings, rejected) = Settings::load_with(lookup_from(&[
            (ENV_WORKERS, "cero"),
            (ENV_PARALLEL, "quizás"),
            (ENV_TOOL_TIMEOUT, "0"),
            (ENV_LOG_LEVEL, "trace"),
        ]));

        assert_eq!(settings.log_level, "trace");
        let variables: Vec<_> = rejected.iter().map(|r| (r.variable, r.value.as_str())).collect();
        assert_eq!(
            variables,
            vec![(ENV_WORKERS, "cero"), (ENV_PARALLEL, "quizás"), (ENV_TOOL_TIMEOUT, "0")]
        );

        let (_, rejected) = Settings::load_with(lookup_from(&[(ENV_WORKERS, "2")]));
        assert!(rejected.is_empty());
    }
}
