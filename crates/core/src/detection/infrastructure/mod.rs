pub mod detector_model;
pub mod hog_feature_map;
pub mod hog_pyramid_detector;
pub mod model_directory;

#[cfg(test)]
pub(crate) mod test_patterns;
