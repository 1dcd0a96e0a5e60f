pub mod episode;
pub mod title;

pub use episode::{Episode, Season};
pub use title::{CastMember, Title, TitleKey, TitleVariant};
