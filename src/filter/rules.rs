//! Reglas de filtrado: forma cruda del JSON y conjunto validado.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::ConfigError;

const MAX_GPS_PRECISION: u32 = 6;

/// Categorías reconocidas en el archivo de reglas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RuleCategory {
    Orientation,
    Gps,
    Timestamp,
    CameraSettings,
    Descriptions,
    Thumbnail,
    Software,
}

impl RuleCategory {
    pub const ALL: [RuleCategory; 7] = [
        RuleCategory::Orientation,
        RuleCategory::Gps,
        RuleCategory::Timestamp,
        RuleCategory::CameraSettings,
        RuleCategory::Descriptions,
        RuleCategory::Thumbnail,
        RuleCategory::Software,
    ];

    pub fn key(self) -> &'static str {
        match self {
            RuleCategory::Orientation => "Orientation",
            RuleCategory::Gps => "GPS",
            RuleCategory::Timestamp => "Timestamp",
            RuleCategory::CameraSettings => "CameraSettings",
            RuleCategory::Descriptions => "Descriptions",
            RuleCategory::Thumbnail => "Thumbnail",
            RuleCategory::Software => "Software",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.key().eq_ignore_ascii_case(key))
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Valor de una categoría tal como aparece en el JSON de configuración.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FilterRule {
    Flag(bool),
    Mode(String),
    Policy(PolicySpec),
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct PolicySpec {
    pub mode: Option<String>,
    pub precision: Option<u32>,
    pub preserve: Option<Vec<String>>,
    pub remove_altitude: Option<bool>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GpsMode {
    Exact,
    WholeDegrees,
    Remove,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimestampMode {
    Exact,
    DateOnly,
    Remove,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraMode {
    All,
    AllExceptMakeModel,
    Remove,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GpsPolicy {
    pub mode: GpsMode,
    pub precision: u32,
    pub remove_altitude: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CameraPolicy {
    pub mode: CameraMode,
    pub preserve: Vec<String>,
}

/// Conjunto de reglas validado; se construye una vez por invocación.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleSet {
    pub orientation: bool,
    pub gps: GpsPolicy,
    pub timestamp: TimestampMode,
    pub camera: CameraPolicy,
    pub descriptions: bool,
    pub thumbnail: bool,
    pub software: bool,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            orientation: true,
            gps: GpsPolicy {
                mode: GpsMode::WholeDegrees,
                precision: 0,
                remove_altitude: true,
            },
            timestamp: TimestampMode::DateOnly,
            camera: CameraPolicy {
                mode: CameraMode::AllExceptMakeModel,
                preserve: vec!["Make".to_string(), "Model".to_string()],
            },
            descriptions: false,
            thumbnail: false,
            software: false,
        }
    }
}

impl RuleSet {
    /// Aplica los atajos de línea de comandos sobre un conjunto ya validado.
    pub fn with_overrides(mut self, remove_gps: bool, keep_timestamp: bool) -> Self {
        if remove_gps {
            self.gps.mode = GpsMode::Remove;
        }
        if keep_timestamp {
            self.timestamp = TimestampMode::Exact;
        }
        self
    }

    /// Valida y aplica una única categoría. En caso de error no modifica nada.
    pub fn apply_rule(&mut self, category: RuleCategory, rule: &FilterRule) -> Result<(), String> {
        match category {
            RuleCategory::Orientation => self.orientation = expect_flag(category, rule)?,
            RuleCategory::Descriptions => self.descriptions = expect_flag(category, rule)?,
            RuleCategory::Thumbnail => self.thumbnail = expect_flag(category, rule)?,
            RuleCategory::Software => self.software = expect_flag(category, rule)?,
            RuleCategory::Gps => self.gps = parse_gps(&self.gps, rule)?,
            RuleCategory::Timestamp => self.timestamp = parse_timestamp(rule)?,
            RuleCategory::CameraSettings => self.camera = parse_camera(&self.camera, rule)?,
        }
        Ok(())
    }

    /// Fusiona un objeto de reglas sobre este conjunto. Nunca falla: cada
    /// entrada inválida se registra y la categoría conserva su valor.
    pub fn merge_object(mut self, overrides: &Map<String, Value>) -> Self {
        for (key, value) in overrides {
            let Some(category) = RuleCategory::from_key(key) else {
                warn!(categoria = %key, "Categoría de regla desconocida; se ignora");
                continue;
            };

            let rule = match serde_json::from_value::<FilterRule>(value.clone()) {
                Ok(rule) => rule,
                Err(error) => {
                    warn!(categoria = %category, %error, "Forma de regla inválida; se mantiene el valor predeterminado");
                    continue;
                }
            };

            if let Err(reason) = self.apply_rule(category, &rule) {
                warn!(categoria = %category, %reason, "Regla inválida; se mantiene el valor predeterminado");
            }
        }
        self
    }
}

fn expect_flag(category: RuleCategory, rule: &FilterRule) -> Result<bool, String> {
    match rule {
        FilterRule::Flag(flag) => Ok(*flag),
        _ => Err(format!("{category} solo admite true o false")),
    }
}

fn parse_gps(current: &GpsPolicy, rule: &FilterRule) -> Result<GpsPolicy, String> {
    let mut policy = current.clone();
    match rule {
        FilterRule::Flag(true) => policy.mode = GpsMode::Exact,
        FilterRule::Flag(false) => policy.mode = GpsMode::Remove,
        FilterRule::Mode(mode) => policy.mode = gps_mode(mode)?,
        FilterRule::Policy(spec) => {
            if let Some(mode) = &spec.mode {
                policy.mode = gps_mode(mode)?;
            }
            if let Some(precision) = spec.precision {
                if precision > MAX_GPS_PRECISION {
                    return Err(format!(
                        "precision {precision} fuera de rango (0..={MAX_GPS_PRECISION})"
                    ));
                }
                policy.precision = precision;
            }
            if let Some(remove_altitude) = spec.remove_altitude {
                policy.remove_altitude = remove_altitude;
            }
            if spec.preserve.is_some() {
                return Err("GPS no admite `preserve`".to_string());
            }
        }
    }
    Ok(policy)
}

fn gps_mode(mode: &str) -> Result<GpsMode, String> {
    match mode {
        "exact" => Ok(GpsMode::Exact),
        "whole_degrees" => Ok(GpsMode::WholeDegrees),
        "remove" => Ok(GpsMode::Remove),
        other => Err(format!("modo GPS desconocido `{other}`")),
    }
}

fn parse_timestamp(rule: &FilterRule) -> Result<TimestampMode, String> {
    let mode = match rule {
        FilterRule::Flag(true) => return Ok(TimestampMode::Exact),
        FilterRule::Flag(false) => return Ok(TimestampMode::Remove),
        FilterRule::Mode(mode) => mode.as_str(),
        FilterRule::Policy(PolicySpec {
            mode: Some(mode),
            precision: None,
            preserve: None,
            remove_altitude: None,
        }) => mode.as_str(),
        FilterRule::Policy(_) => return Err("Timestamp solo admite `mode`".to_string()),
    };
    match mode {
        "exact" => Ok(TimestampMode::Exact),
        "date_only" => Ok(TimestampMode::DateOnly),
        "remove" => Ok(TimestampMode::Remove),
        other => Err(format!("modo Timestamp desconocido `{other}`")),
    }
}

fn parse_camera(current: &CameraPolicy, rule: &FilterRule) -> Result<CameraPolicy, String> {
    let mut policy = current.clone();
    match rule {
        FilterRule::Flag(true) => policy.mode = CameraMode::All,
        FilterRule::Flag(false) => policy.mode = CameraMode::Remove,
        FilterRule::Mode(mode) => policy.mode = camera_mode(mode)?,
        FilterRule::Policy(spec) => {
            if let Some(mode) = &spec.mode {
                policy.mode = camera_mode(mode)?;
            }
            if let Some(preserve) = &spec.preserve {
                policy.preserve = preserve.clone();
            }
            if spec.precision.is_some() || spec.remove_altitude.is_some() {
                return Err("CameraSettings solo admite `mode` y `preserve`".to_string());
            }
        }
    }
    Ok(policy)
}

fn camera_mode(mode: &str) -> Result<CameraMode, String> {
    match mode {
        "all" => Ok(CameraMode::All),
        "all_except_make_model" => Ok(CameraMode::AllExceptMakeModel),
        "remove" => Ok(CameraMode::Remove),
        other => Err(format!("modo CameraSettings desconocido `{other}`")),
    }
}

fn parse_overrides(contents: &str) -> Result<Map<String, Value>, ConfigError> {
    match serde_json::from_str::<Value>(contents)? {
        Value::Object(map) => Ok(map),
        _ => Err(ConfigError::NotAnObject),
    }
}

/// Construye un conjunto de reglas a partir del texto JSON del usuario.
pub fn rules_from_str(contents: &str) -> RuleSet {
    match parse_overrides(contents) {
        Ok(overrides) => RuleSet::default().merge_object(&overrides),
        Err(error) => {
            warn!(%error, "Configuración de reglas inválida; se usan las reglas predeterminadas");
            RuleSet::default()
        }
    }
}

/// Carga las reglas. Sin ruta, o ante cualquier problema con el archivo,
/// devuelve las reglas predeterminadas.
pub fn load_rules(config_path: Option<&Path>) -> RuleSet {
    let Some(path) = config_path else {
        debug!("Sin archivo de reglas; se usan las predeterminadas");
        return RuleSet::default();
    };

    match fs::read_to_string(path).map_err(ConfigError::from) {
        Ok(contents) => rules_from_str(&contents),
        Err(error) => {
            warn!(ruta = %path.display(), %error, "No se pudo leer el archivo de reglas; se usan las predeterminadas");
            RuleSet::default()
        }
    }
}
