pub mod analysis;
pub mod segmenter;
pub mod statistics;
