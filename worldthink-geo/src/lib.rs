//! Country name resolution and map styling.
//!
//! - [`aliases`]: the static alias table and [`aliases::resolve`]
//! - [`index`]: [`index::CountryIndex`], the analysis lookup a map click handler calls
//! - [`map`]: stance colours, feature styling and the GeoJSON [`map::MapRenderer`]
pub mod aliases;
pub mod index;
pub mod map;

pub use aliases::resolve;
pub use index::CountryIndex;
pub use map::{style_features, MapRenderer, MatchStats, StyledMap};
