//! The library code for the `devrun` blog generator. The architecture can be
//! generally broken down into three steps:
//!
//! 1. Loading the project configuration and site metadata ([`crate::config`])
//! 2. Parsing posts from source files on disk ([`crate::post`]) and ranking
//!    their categories by frequency ([`crate::category`])
//! 3. Converting the posts into output files on disk ([`crate::write`])
//!
//! The third step builds post pages, the paginated main index, one paginated
//! index per category (in ranked order), and the about page. Every page is
//! rendered with the shared page footer ([`crate::footer`]); post pages also
//! get the comment widget ([`crate::comments`]), which reads the page's theme
//! from an injected [`crate::document::Document`].
//!
//! [`crate::build::build_site`] ties the steps together.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod category;
pub mod comments;
pub mod config;
pub mod document;
pub mod footer;
pub mod markdown;
pub mod post;
pub mod write;

mod util;
mod value;

pub use category::{count_categories, rank_categories_by_frequency, Categorized, CategoryCount};
