pub mod availability;
pub mod error;
pub mod factory;
pub mod http;
pub mod memory;
pub mod supabase;
pub mod tmdb;
pub mod traits;
pub mod tvmaze;

pub use availability::AvailabilityClient;
pub use error::{SourceError, SourceResult};
pub use factory::{SourceFactory, Sources};
pub use memory::MemoryStore;
pub use supabase::SupabaseStore;
pub use tmdb::TmdbClient;
pub use traits::{AvailabilityProvider, CatalogProvider, RuntimeProvider, WatchlistStore};
pub use tvmaze::TvMazeClient;
