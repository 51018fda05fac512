// Moderation — the gate every outbound chat message passes through.
//
// LocalFilter catches known-bad terms instantly. Anything else goes to a
// ToxicityScorer (GeminiScorer in production) under a timeout, and the
// admission policy turns the result into transmit / mask / block.

pub mod admission;
pub mod credentials;
pub mod gate;
pub mod gemini;
pub mod lexical;
pub mod thresholds;
pub mod traits;

pub use admission::{Admission, AdmissionPolicy, SevereAction};
pub use gate::ModerationGate;
pub use thresholds::Thresholds;
pub use traits::{ScanScore, ScoreSource, ToxicityLabel, ToxicityResult, ToxicityScorer};
