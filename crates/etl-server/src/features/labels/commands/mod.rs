pub mod add;
pub mod auto_label;

pub use add::{AddLabelCommand, AddLabelError};
pub use auto_label::AutoLabelResponse;
