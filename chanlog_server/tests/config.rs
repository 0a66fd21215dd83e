use chanlog_server::config::*;
use pretty_assertions::assert_eq;

const CONFIG: &str = r##"{
    "server": "irc.example.net",
    "log-file": "sioc.log",
    "session": {
        "nick": "sioc",
        "user": "sioc",
        "realname": "SIOC bot",
        "channels": ["#sioc", "#footest"],
        "admin": "tuukkah",
        "root-uri": "http://example.org/irclogs/",
        "ping-timeout": 60
    },
    "logging": {
        "dir": "logs",
        "default-level": "info",
        "module-levels": { "chanlog_session::membership": "warn" },
        "targets": [
            { "target": "stderr" },
            { "target": { "filename": "chanlog.log" }, "level": "debug", "modules": ["chanlog_session"] }
        ]
    }
}"##;

#[test]
fn full_config() {
    let config: ServerConfig = serde_json::from_str(CONFIG).unwrap();

    assert_eq!(config.address(), "irc.example.net:6667");
    assert_eq!(config.log_file.to_str(), Some("sioc.log"));

    let session = &config.session;
    assert_eq!(session.channels, ["#sioc", "#footest"]);
    assert_eq!(session.admin.as_deref(), Some("tuukkah"));
    assert!(session.identify_msg);
    assert_eq!(session.registration_timeout, 120);
    assert_eq!(session.keepalive_interval, 300);
    assert_eq!(session.ping_timeout, 60);

    let logging = &config.logging;
    assert_eq!(logging.prefix_file("x.log").to_str(), Some("logs/x.log"));
    assert_eq!(logging.targets.len(), 2);
    assert!(matches!(
        logging.targets[0].target,
        LogTarget::Builtin(BuiltinLogTarget::Stderr)
    ));
    assert!(matches!(logging.targets[1].target, LogTarget::File { .. }));
    assert!(matches!(logging.targets[1].level, Some(LogLevel::Debug)));
}

#[test]
fn minimal_config() {
    let config: ServerConfig = serde_json::from_str(
        r#"{
            "server": "localhost",
            "port": 6697,
            "log-file": "chan.log",
            "session": { "nick": "bot", "user": "bot", "realname": "Logger" }
        }"#,
    )
    .unwrap();

    assert_eq!(config.address(), "localhost:6697");
    assert!(config.session.channels.is_empty());
    assert!(config.session.root_uri.is_none());
    assert_eq!(config.logging.targets.len(), 1);
}

#[test]
fn missing_file() {
    assert!(matches!(
        load_config("/nonexistent/chanlog.json"),
        Err(ConfigError::Io(_))
    ));
}
