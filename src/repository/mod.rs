pub mod local;
pub mod normalize;
pub mod remote;
pub mod traits;

pub use local::LocalRepository;
pub use normalize::{FlatRecordNormalizer, Normalizer, RecordShape, StructuredNormalizer};
pub use remote::RemoteRepository;
pub use traits::{PropertyRepository, FEATURED_LIMIT};
