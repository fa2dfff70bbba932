pub mod classifier;
pub mod correlator;
pub mod outcome;
pub mod payload;
pub mod tree;
pub mod view;
