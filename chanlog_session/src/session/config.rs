use std::time::Duration;

/// Identity and behaviour of one logging session
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SessionConfig {
    pub nick: String,
    pub user: String,
    pub realname: String,
    #[serde(default)]
    pub channels: Vec<String>,
    /// Nick allowed to give the bot commands in private
    #[serde(default)]
    pub admin: Option<String>,
    /// Base URI of the published logs, for answering `pointer`
    #[serde(default)]
    pub root_uri: Option<String>,
    /// Ask the server to mark message bodies with the sender's
    /// identification status
    #[serde(default = "default_true")]
    pub identify_msg: bool,
    /// Seconds to wait for the server to accept our registration
    #[serde(default = "default_registration_timeout")]
    pub registration_timeout: u64,
    /// Seconds between a keepalive reply and the next keepalive ping
    #[serde(default = "default_keepalive_interval")]
    pub keepalive_interval: u64,
    /// Seconds to wait for a keepalive reply
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout: u64,
}

fn default_true() -> bool {
    true
}

fn default_registration_timeout() -> u64 {
    120
}

fn default_keepalive_interval() -> u64 {
    300
}

fn default_ping_timeout() -> u64 {
    300
}

impl SessionConfig {
    pub fn new(nick: impl Into<String>, user: impl Into<String>, realname: impl Into<String>) -> Self {
        Self {
            nick: nick.into(),
            user: user.into(),
            realname: realname.into(),
            channels: Vec::new(),
            admin: None,
            root_uri: None,
            identify_msg: default_true(),
            registration_timeout: default_registration_timeout(),
            keepalive_interval: default_keepalive_interval(),
            ping_timeout: default_ping_timeout(),
        }
    }

    pub fn registration_timeout(&self) -> Duration {
        Duration::from_secs(self.registration_timeout)
    }

    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_secs(self.ping_timeout)
    }
}
