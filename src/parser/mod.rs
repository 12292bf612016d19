pub mod blocks;
pub mod duration;

pub use blocks::parse_blocks;
pub use duration::parse_duration;
