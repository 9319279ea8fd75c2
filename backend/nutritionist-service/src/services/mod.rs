/// Business logic layer
///
/// Each service opens one store snapshot per call and assembles the API view
/// from it. Rating math lives in `rating` so both the ranking and the profile
/// read the same aggregation rules.
pub mod directory;
pub mod image;
pub mod profile;
pub mod ranking;
pub mod rating;

pub use directory::DirectoryService;
pub use image::{CdnImageResolver, ImageUrlResolver};
pub use profile::ProfileService;
pub use ranking::RankingService;
