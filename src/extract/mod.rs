//! Tiered extraction: three independent data channels, one record schema.
//!
//! The site exposes the same postings through three unreliable,
//! independently-changing channels, attempted in a fixed fallback order:
//!
//! | Tier | Module | Channel | Notes |
//! |------|--------|---------|-------|
//! | 1 | [`api`] | Next.js data endpoint | Fast; needs a build token, shape not fixed |
//! | 2 | [`jsonld`] | Embedded JSON-LD | Authoritative when present; detail pages only |
//! | 3 | [`markup`] | Raw page markup | Slowest but most stable; list + detail + pagination |
//!
//! Supporting modules:
//! - [`discovery`]: recovers the build token Tier 1 needs
//! - [`reconcile`]: merges Tier 2/Tier 3/list-page views of one posting
//!
//! # Common Patterns
//!
//! Every shape-dependent lookup is an ordered table — candidate JSON paths,
//! candidate property names, candidate selectors, candidate label patterns —
//! evaluated in fixed rank order with early exit on first success. Adding
//! support for a new payload shape or page layout means adding a table
//! entry, not new control flow.

pub mod api;
pub mod discovery;
pub mod jsonld;
pub mod markup;
pub mod reconcile;
