//! Pipeline stages for keyword-anchored address extraction.
//!
//! Each submodule implements exactly one step. Only [`page`] knows the order
//! they run in; everything else is a pure function of its inputs and can be
//! tested without a PDF or a recognition engine.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ [full-page OCR] ──▶ anchor ──▶ region ──▶ crop
//! (path)    (pdfium)                      (keyword)  (offsets)  (sub-image)
//!                                                                  │
//!                    address ◀── [focused OCR] ◀───────────────────┘
//!                 (filter+normalise)
//! ```
//!
//! 1. [`input`]   — validate the user-supplied path is a readable PDF
//! 2. [`render`]  — rasterise pages lazily via pdfium; also exposes the
//!    embedded text layer
//! 3. [`anchor`]  — first-match-wins search for an anchor keyword
//! 4. [`region`]  — apply keyword offsets, clamp, add the margin
//! 5. [`crop`]    — cut the refined region out of the page image
//! 6. [`address`] — keep address-like fragments and normalise them
//! 7. [`page`]    — run 3–6 for one page and report a [`crate::output::PageOutcome`]

pub mod address;
pub mod anchor;
pub mod crop;
pub mod input;
pub mod page;
pub mod region;
pub mod render;
