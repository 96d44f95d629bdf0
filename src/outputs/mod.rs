//! Output generation for scraped job records.
//!
//! # Submodules
//!
//! - [`jsonl`]: Appends accepted records to a date-stamped JSON-Lines file
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! └── jobs_2026-08-06.jsonl   # one serialized JobRecord per line
//! ```
//!
//! The sink is append-only: records are written in the order they are
//! accepted, and re-running on the same day extends the same file rather
//! than replacing it.

pub mod jsonl;
