//! Person tracking, identity resolution and entry events for camera feeds.
//!
//! Each camera runs a sequential [`pipeline::camera_pipeline::CameraPipeline`]
//! that turns per-frame person and phone detections into stable tracks,
//! resolves who each track is against a cached face registry, and emits
//! rate-limited `entry`, `exit`, `unauthorized` and `phone_detected` events.

pub mod shared {
    pub mod bbox;
    pub mod constants;
    pub mod duration_secs;
    pub mod frame;
    pub mod ids;
}

pub mod detection {
    pub mod domain {
        pub mod detection_adapter;
    }
    pub mod infrastructure;
}

pub mod tracking {
    pub mod domain {
        pub mod assigner;
        pub mod associator;
        pub mod track;
        pub mod track_store;
    }
    pub mod infrastructure;
}

pub mod identity {
    pub mod domain {
        pub mod duplicate_checker;
        pub mod embedding;
        pub mod identity_resolver;
        pub mod registry_cache;
        pub mod registry_snapshot;
        pub mod registry_store;
    }
    pub mod infrastructure;
}

pub mod decision {
    pub mod domain {
        pub mod decision_machine;
        pub mod phone_monitor;
    }
}

pub mod events {
    pub mod domain {
        pub mod event;
        pub mod event_emitter;
        pub mod event_sink;
    }
    pub mod infrastructure;
}

pub mod video {
    pub mod domain {
        pub mod frame_source;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod camera_pipeline;
    pub mod camera_runner;
    pub mod config;
    pub mod infrastructure;
    pub mod pipeline_logger;
}

#[cfg(test)]
pub(crate) mod testing;
