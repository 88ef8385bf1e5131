pub mod item;
pub mod report;
pub mod tally;
