pub mod mutation;
pub mod query;

pub use mutation::{Acknowledgement, UserMutationService};
pub use query::UserQueryService;
