pub mod add;
pub mod notebooks;
pub mod plan;
pub mod review;
pub mod stats;
