// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust structs and traits describing what the system
// works with. No Burn types, no file I/O.

/// An aligned source/target sentence
pub mod sentence_pair;

/// Pad / start / end / ignore token ids shared by data and model
pub mod special_tokens;

/// Abstractions implemented by the data and application layers
pub mod traits;
