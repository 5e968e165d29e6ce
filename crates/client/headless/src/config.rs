//! Headless driver configuration.
use std::env;
use std::path::PathBuf;

/// Settings for a single scripted encounter.
#[derive(Clone, Debug)]
pub struct HeadlessConfig {
    pub data_dir: PathBuf,
    pub quest: u32,
    pub session_id: Option<String>,
    /// Optional TCP address to accept remote peers on.
    pub listen: Option<String>,
    pub host_name: String,
    pub companion_name: String,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/../../game/content/data"
            )),
            quest: 0,
            session_id: None,
            listen: None,
            host_name: "host".to_string(),
            companion_name: "companion".to_string(),
        }
    }
}

impl HeadlessConfig {
    /// Construct configuration from process environment variables.
    ///
    /// - `COMBAT_DATA_DIR` - content directory (default: bundled data)
    /// - `COMBAT_QUEST` - quest index to play (default: 0)
    /// - `COMBAT_SESSION_ID` - log directory name (default: timestamp)
    /// - `COMBAT_LISTEN` - TCP address for remote peers (default: none)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = env::var("COMBAT_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(quest) = read_env::<u32>("COMBAT_QUEST") {
            config.quest = quest;
        }
        config.session_id = env::var("COMBAT_SESSION_ID").ok();
        config.listen = env::var("COMBAT_LISTEN").ok().filter(|a| !a.is_empty());

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
