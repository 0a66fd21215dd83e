use chanlog_proto::{ChannelName, Line, Nickname};
use chanlog_session::membership::MembershipTracker;
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

fn nick(n: &str) -> Nickname {
    Nickname::from(n)
}

fn chan(c: &str) -> ChannelName {
    ChannelName::from(c)
}

fn roster(tracker: &MembershipTracker, channel: &str) -> Vec<String> {
    tracker
        .roster(&chan(channel))
        .unwrap_or_default()
        .iter()
        .map(|n| n.to_string())
        .collect()
}

fn welcomed() -> MembershipTracker {
    let mut tracker = MembershipTracker::new();
    tracker.welcome(&nick("bot"));
    tracker.join(&nick("bot"), &chan("#chan"));
    tracker
}

#[test]
fn self_join_after_welcome() {
    let tracker = welcomed();
    assert_eq!(roster(&tracker, "#chan"), ["bot"]);
    assert_eq!(
        tracker.self_channels().iter().map(|c| c.to_string()).collect::<Vec<_>>(),
        ["#chan"]
    );
    assert!(tracker.is_consistent());
}

#[test]
fn rename_keeps_position() {
    let mut tracker = welcomed();
    tracker.join(&nick("alice"), &chan("#chan"));
    tracker.join(&nick("bob"), &chan("#chan"));
    tracker.nick_change(&nick("alice"), &nick("alicia"));

    assert_eq!(roster(&tracker, "#chan"), ["bot", "alicia", "bob"]);
    assert!(tracker.channels_of(&nick("alice")).is_none());
    assert!(tracker.is_on(&nick("alicia"), &chan("#chan")));
    assert!(tracker.is_consistent());
}

#[test]
fn roster_refresh_strips_markers_and_reconciles() {
    let mut tracker = welcomed();
    tracker.join(&nick("stale"), &chan("#chan"));
    tracker.join(&nick("stale"), &chan("#other"));

    tracker.roster_chunk(&chan("#chan"), "@op +voice");
    tracker.roster_chunk(&chan("#chan"), "plain");
    tracker.roster_complete(&chan("#chan"));

    assert_eq!(roster(&tracker, "#chan"), ["op", "voice", "plain"]);
    assert!(!tracker.is_on(&nick("stale"), &chan("#chan")));
    assert!(!tracker.is_on(&nick("bot"), &chan("#chan")));
    assert!(tracker.is_on(&nick("stale"), &chan("#other")));
    assert!(tracker.is_consistent());
}

#[test]
fn matching_refresh_changes_nothing() {
    let mut tracker = welcomed();
    tracker.join(&nick("alice"), &chan("#chan"));
    tracker.join(&nick("alice"), &chan("#two"));
    let before = (roster(&tracker, "#chan"), tracker.channels_of(&nick("alice")).cloned());

    tracker.roster_chunk(&chan("#chan"), "@alice bot");
    tracker.roster_complete(&chan("#chan"));

    let mut after_roster = roster(&tracker, "#chan");
    after_roster.sort();
    let mut before_roster = before.0;
    before_roster.sort();
    assert_eq!(after_roster, before_roster);
    assert_eq!(tracker.channels_of(&nick("alice")).cloned(), before.1);
    assert!(tracker.is_consistent());
}

#[test]
fn quit_leaves_every_channel() {
    let mut tracker = welcomed();
    for channel in ["#chan", "#two", "#three"] {
        tracker.join(&nick("alice"), &chan(channel));
        tracker.join(&nick("bob"), &chan(channel));
    }

    tracker.quit(&nick("ALICE"));

    for channel in ["#two", "#three"] {
        assert_eq!(roster(&tracker, channel), ["bob"]);
    }
    assert_eq!(roster(&tracker, "#chan"), ["bot", "bob"]);
    assert!(tracker.channels_of(&nick("alice")).is_none());
    assert!(tracker.is_consistent());
}

#[test]
fn relevance_is_judged_before_the_event() {
    let mut tracker = welcomed();
    tracker.join(&nick("alice"), &chan("#chan"));

    let quit = Line::parse(":alice!a@h QUIT :bye", None).unwrap();
    assert!(tracker.is_relevant(&quit, &chan("#chan")));
    tracker.apply(&quit);
    assert!(!tracker.is_relevant(&quit, &chan("#chan")));
}

const NICKS: &[&str] = &["bot", "alice", "Alice", "bob", "carol", "dave"];
const CHANNELS: &[&str] = &["#a", "#B", "#b", "#c"];

/// One random membership event, as the server would send it
fn random_line(rng: &mut StdRng) -> String {
    let actor = NICKS.choose(rng).unwrap();
    let other = NICKS.choose(rng).unwrap();
    let channel = CHANNELS.choose(rng).unwrap();

    match rng.gen_range(0..20) {
        0 => format!(":srv 001 {} :Welcome", actor),
        1..=6 => format!(":{}!u@h JOIN {}", actor, channel),
        7 | 8 => format!(":{}!u@h PART {}", actor, channel),
        9 => format!(":{}!u@h KICK {} {} :out", actor, channel, other),
        10 => format!(":{}!u@h QUIT :bye", actor),
        11 | 12 => format!(":{}!u@h NICK {}", actor, other),
        13..=16 => {
            let mut names = Vec::new();
            for n in NICKS {
                if rng.gen_bool(0.4) {
                    let marker = ["", "@", "+", "@+"].choose(rng).unwrap();
                    names.push(format!("{}{}", marker, n));
                }
            }
            format!(":srv 353 bot = {} :{}", channel, names.join(" "))
        }
        _ => format!(":srv 366 bot {} :End of NAMES list.", channel),
    }
}

#[test]
fn random_events_keep_indices_consistent() {
    for seed in 0..50 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut tracker = MembershipTracker::new();

        for step in 0..500 {
            let raw = random_line(&mut rng);
            tracker.apply(&Line::parse(&raw, None).unwrap());
            assert!(
                tracker.is_consistent(),
                "seed {} step {}: inconsistent after {:?}\n{:#?}",
                seed,
                step,
                raw,
                tracker
            );
        }
    }
}
