pub mod cached_client;
pub mod client;
pub mod error;
pub mod keys;
pub mod types;

pub use cached_client::{CachedApiClient, CharacterQuery, CharactersQuery, EpisodesQuery};
pub use error::ApiError;
pub use keys::{CharacterKey, CharactersKey, EpisodesKey};
pub use types::{Character, CharacterStatus, Page};
