// CogniPrint Core Services

pub mod derive;
pub mod extraction;
pub mod lexical;
pub mod scoring;
pub mod segmenter;

pub use derive::derive_all;
pub use extraction::fill_extraction_json;
pub use segmenter::{compute_unit_lengths, segment_text};
