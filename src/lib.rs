//! Motor de metaclean: limpieza y filtrado selectivo de metadata.
//!
//! Cada archivo se clasifica por extensión, se valida y se entrega a una
//! cadena ordenada de adaptadores. Si un adaptador falla se intenta el
//! siguiente; el resultado siempre es un [`dispatcher::Dispatch`] etiquetado.

pub mod adapters;
pub mod backup;
pub mod batch;
pub mod classifier;
pub mod cleaner;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod filter;
pub mod formatting;
pub mod logging;
pub mod metadata;
pub mod output;
pub mod ui;

pub use batch::{BatchCoordinator, BatchEvent, BatchReport, StopHandle};
pub use classifier::{Classification, FileCategory, classify};
pub use cleaner::{CleanOptions, Cleaner, FileReport};
pub use config::Settings;
pub use dispatcher::{AdapterAttempt, Dispatch, DispatchOutcome, ExtractionOutcome, FallbackDispatcher};
pub use filter::{FilterRule, RuleSet, apply, load_rules};
pub use metadata::{FieldKey, FieldValue, MetadataMap};
