pub mod replay_detection_adapter;
pub mod replay_recording;
