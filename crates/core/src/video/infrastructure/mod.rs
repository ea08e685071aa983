pub mod replay_frame_source;
