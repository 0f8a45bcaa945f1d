//! Filtrado selectivo: decide qué campos se conservan y cómo se degradan.

mod fields;
mod rules;
mod transforms;

pub use rules::{
    CameraMode, CameraPolicy, FilterRule, GpsMode, GpsPolicy, PolicySpec, RuleCategory, RuleSet,
    TimestampMode, load_rules, rules_from_str,
};
pub use transforms::{TransformError, apply, date_part, round_coordinate};
