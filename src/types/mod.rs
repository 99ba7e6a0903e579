pub mod error;
pub mod evidence;
pub mod facts;
pub mod prd;
pub mod question;
pub mod utils;

pub use error::{CompletionError, ErrorCategory, ErrorClassifier, PrdError, Result};
pub use evidence::{EvidenceDocument, EvidenceType};
pub use facts::{
    ApiEndpoint, DataModel, EventFact, ExtractionMetadata, ModelField, NavigationEdge, Screen,
    StatePattern, TechnicalFacts,
};
pub use prd::{DetailedSections, LeanCanvas, Persona, Prd, SectionKind, StrategicFields};
pub use question::{ClientQuestion, Priority, QuestionLog};
pub use utils::{capitalize_first, json_string, log_skip, take_chars};
