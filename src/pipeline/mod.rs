//! Pipeline stages for OCR-table extraction.
//!
//! Each submodule implements exactly one transformation step, and every
//! step is a pure function of its inputs.
//!
//! ## Data Flow
//!
//! ```text
//! segment ──▶ title ──▶ repair ──▶ normalize
//! (blocks)   (caption)  (cells)    (records)
//! ```
//!
//! 1. [`segment`]  : unwrap wrapped rows and cut each page into pipe-table blocks
//! 2. [`title`]    : pick the nearest caption above each block, skipping
//!    headings that repeat across the document
//! 3. [`repair`]   : merge split currency cells and fix the header separator
//! 4. [`normalize`]: turn each table into one record per numeric cell

pub mod normalize;
pub mod repair;
pub mod segment;
pub mod title;
