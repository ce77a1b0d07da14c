pub mod detector_bank;
pub mod joint_evaluator;
pub mod object_detector;
pub mod overlap_tester;
