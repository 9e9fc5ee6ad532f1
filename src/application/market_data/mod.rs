pub mod grid_aligner;
