//! Trace ingestion and backend adapters for Hybrid Race Coach

pub mod coordinates;
pub mod csv_trace;
pub mod demo;
pub mod gemini;
pub mod local_model;
pub mod speech;

pub use csv_trace::{parse_trace, IngestError};
pub use demo::DemoTrace;
pub use gemini::GeminiClient;
pub use local_model::LocalModel;
pub use speech::TracingVoice;
