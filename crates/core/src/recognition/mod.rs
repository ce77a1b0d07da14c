pub mod object_recognizer;
pub mod recognizer_config;
