//! Markdown rendering for fixed-width terminals.
//!
//! The table engine is a pipeline of pure functions:
//! [`table::detect`] → [`layout::allocate`] → [`wrap::wrapped_line_count`] →
//! [`grid::render`]. Everything else in the document goes through
//! pulldown-cmark in [`render`].

pub mod ansi;
pub mod blocks;
pub mod grid;
pub mod highlight;
pub mod inline;
pub mod layout;
pub mod render;
pub mod table;
pub mod width;
pub mod wrap;

pub use render::{RenderOptions, render_markdown};
