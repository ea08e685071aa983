pub mod threaded_camera_supervisor;
