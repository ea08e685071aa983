pub const DEFAULT_IOU_THRESHOLD: f64 = 0.3;
pub const DEFAULT_MIN_HITS: u32 = 1;
/// Max frames a track can go unmatched before removal (~1 second at 30 fps).
pub const DEFAULT_MAX_AGE: u32 = 30;
pub const DEFAULT_MIN_PERSON_CONFIDENCE: f64 = 0.5;
/// Phones are small and detected with lower confidence than people.
pub const DEFAULT_MIN_PHONE_CONFIDENCE: f64 = 0.3;

pub const DEFAULT_FACE_SAMPLE_INTERVAL: u32 = 10;
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.5;
pub const DEFAULT_DUPLICATE_THRESHOLD: f64 = 0.7;
pub const DEFAULT_REGISTRY_TTL_SECS: u64 = 300;

pub const DEFAULT_MIN_FACE_ATTEMPTS: u32 = 3;
pub const DEFAULT_GRACE_WITH_FACE_SECS: u64 = 3;
pub const DEFAULT_GRACE_WITHOUT_FACE_SECS: u64 = 15;

pub const DEFAULT_ENTRY_COOLDOWN_SECS: u64 = 30;
pub const DEFAULT_UNAUTHORIZED_COOLDOWN_SECS: u64 = 30;
pub const DEFAULT_PHONE_COOLDOWN_SECS: u64 = 10;
pub const DEFAULT_SUBJECT_DEDUP_WINDOW_SECS: u64 = 30;

pub const DEFAULT_RECONNECT_BACKOFF_SECS: u64 = 1;
pub const DEFAULT_PROGRESS_EVERY_FRAMES: usize = 300;

/// Minimum IoU between a requested region and a recorded person box for a
/// replayed embedding to be handed out.
pub const REPLAY_EMBED_MIN_IOU: f64 = 0.5;

pub const CONFIG_DIR_NAME: &str = "gatekeeper";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const REGISTRY_FILE_NAME: &str = "registry.json";
