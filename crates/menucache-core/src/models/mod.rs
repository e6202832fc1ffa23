//! Data models for menu entities.
//!
//! - `MenuItem`: a single dish or drink with price, tags and inventory
//! - `MenuCollection`: an ordered, validated list of items
//! - `sample_menu`: the bundled collection used when no remote is configured

pub mod menu;
pub mod sample;

pub use menu::{MenuCollection, MenuItem};
pub use sample::sample_menu;
