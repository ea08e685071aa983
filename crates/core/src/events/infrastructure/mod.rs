pub mod channel_event_sink;
pub mod json_lines_event_sink;
pub mod log_event_sink;
