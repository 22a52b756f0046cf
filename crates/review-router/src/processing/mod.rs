pub mod chunker;

pub use chunker::{ReviewChunker, ReviewRecord};
