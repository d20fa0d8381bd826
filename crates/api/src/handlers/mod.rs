pub mod jobs;
pub mod page;
pub mod results;
