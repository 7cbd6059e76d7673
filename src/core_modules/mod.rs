pub mod image_helper;
pub mod labeling;
pub mod masker;
pub mod proximity_clusterer;
pub mod region;
pub mod spot;
pub mod spot_extractor;
pub mod sweep_profiler;
pub mod threshold_optimizer;
pub mod threshold_range;
