// Artifact I/O operations

pub mod columnar;
pub mod error;
pub mod render;
pub mod store;
pub mod xlsx;

pub use columnar::{decode_schedule, encode_schedule, SCHEDULE_FORMAT_VERSION};
pub use error::IoError;
pub use render::{full_workbook, shifted_workbook};
pub use store::{ArtifactKind, ArtifactStore};
pub use xlsx::read_grid;
