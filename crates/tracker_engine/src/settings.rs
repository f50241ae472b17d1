use std::time::Duration;

/// Connection and pacing settings for the task service client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Service root, e.g. `https://tracker.example.com`.
    pub base_url: String,
    /// Path prefix under which every endpoint lives.
    pub api_prefix: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    /// Result-count hint sent with every new task (`topN`).
    pub result_count: u32,
    /// How many recent searches to pull when building a keyword's history.
    pub history_limit: u32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            api_prefix: "api/tiktok".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(5),
            result_count: 30,
            history_limit: 50,
        }
    }
}
