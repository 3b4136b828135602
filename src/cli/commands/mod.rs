pub mod completions;
pub mod refs;
pub mod render;
pub mod schema;
