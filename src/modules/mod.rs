pub mod sky;

pub use self::sky::{SkyQuery, SkyService};
