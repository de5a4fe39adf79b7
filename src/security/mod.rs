//! Steganography detection for stegscan.
//!
//! Every input flows through the [`FusionEngine`], which picks the
//! detectors relevant to the input's modality and runs them in two tiers.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      FusionEngine                         │
//! │                                                          │
//! │  Text  ──► UnicodeScanner ──► EmojiScanner ──┐           │
//! │            (zero-width, homoglyphs, entropy,  │           │
//! │             selectors, BiDi/tags/spaces)      │           │
//! │                                     cascade ──┤           │
//! │  Emoji ──► same cheap tier ──► EmojiFingerprinter         │
//! │                                               │           │
//! │  Image ──► ContainerInspector ──► LsbAnalyzer │           │
//! │            (trailing data,      (chi-square,  │           │
//! │             tool signatures)     SPA, RS, ...)│           │
//! │                                               ▼           │
//! │            weighted fusion ──► codec oracle ──► result    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`detectors`] - Core trait and types for all detectors
//! - [`input`] - Scan input validation and borrowed views
//! - [`patterns`] - Compiled regex patterns (lazy-initialized)
//! - [`confusables`] - Latin look-alike table
//! - [`unicode`] - Character-level text checks
//! - [`emoji`] - Cluster-level emoji checks
//! - [`stats`] - Incomplete gamma and chi-square tail
//! - [`lsb`] - Statistical LSB estimators
//! - [`container`] - Image container structure checks
//! - [`fusion`] - FusionEngine orchestrator

pub mod confusables;
pub mod container;
pub mod detectors;
pub mod emoji;
pub mod fusion;
pub mod input;
pub mod lsb;
pub mod patterns;
pub mod stats;
pub mod unicode;

// Re-export primary types for convenience
pub use container::ContainerInspector;
pub use detectors::{Category, Detection, Detector, Modality, Severity, Signal, Tier};
pub use emoji::{EmojiFingerprinter, EmojiReport, EmojiScanner};
pub use fusion::{classify, FusionEngine, ScanResult};
pub use input::{ContainerFormat, ImageInput, ScanInput, ScanSubject};
pub use lsb::{LsbAnalyzer, LsbReport};
pub use unicode::UnicodeScanner;
