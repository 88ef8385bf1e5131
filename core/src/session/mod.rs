pub mod board;
pub mod check;
pub mod notice;
