pub mod classifier;
pub mod color_space;
pub mod frame;
pub mod morphology;
pub mod overlay;
pub mod palette;
pub mod region;
pub mod resolver;
pub mod utils;
