//! Input/output plumbing for rendered reports and readings.
mod writers;


pub use writers::{read_input, write_output};
