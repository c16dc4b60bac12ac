//! Persistence of run artifacts.
//!
//! # Output Structure
//!
//! ```text
//! data_dir/
//! └── articles_2025-03-01.json    # raw collection, cities/rationale empty
//!
//! output_dir/
//! └── analysis_2025-03-01.json    # annotated articles
//! ```

pub mod json;
