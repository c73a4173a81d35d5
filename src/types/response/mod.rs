mod group;
mod headers;
mod overview;
pub(crate) mod util;

pub use group::Group;
pub use headers::HeaderFields;
pub use overview::OverviewEntry;
