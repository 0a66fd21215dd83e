//! Mapping between numeric reply codes and their symbolic names.
//!
//! Each symbolic name is also exported as a constant, so handlers can match
//! on `numeric::RPL_NAMREPLY` rather than on the bare string.

use std::collections::HashMap;
use std::sync::OnceLock;

macro_rules! numerics {
    ( $( $code:literal => $name:ident ),* $(,)? ) => {
        $(
            pub const $name: &str = stringify!($name);
        )*

        const NUMERICS: &[(&str, &str)] = &[ $( ($code, stringify!($name)) ),* ];
    };
}

numerics! {
    "001" => RPL_WELCOME,
    "002" => RPL_YOURHOST,
    "003" => RPL_CREATED,
    "004" => RPL_MYINFO,
    "005" => RPL_ISUPPORT,
    "200" => RPL_TRACELINK,
    "201" => RPL_TRACECONNECTING,
    "202" => RPL_TRACEHANDSHAKE,
    "203" => RPL_TRACEUNKNOWN,
    "204" => RPL_TRACEOPERATOR,
    "205" => RPL_TRACEUSER,
    "206" => RPL_TRACESERVER,
    "208" => RPL_TRACENEWTYPE,
    "211" => RPL_STATSLINKINFO,
    "212" => RPL_STATSCOMMANDS,
    "219" => RPL_ENDOFSTATS,
    "221" => RPL_UMODEIS,
    "242" => RPL_STATSUPTIME,
    "243" => RPL_STATSOLINE,
    "250" => RPL_STATSCONN,
    "251" => RPL_LUSERCLIENT,
    "252" => RPL_LUSEROP,
    "253" => RPL_LUSERUNKNOWN,
    "254" => RPL_LUSERCHANNELS,
    "255" => RPL_LUSERME,
    "256" => RPL_ADMINME,
    "257" => RPL_ADMINLOC1,
    "258" => RPL_ADMINLOC2,
    "259" => RPL_ADMINEMAIL,
    "263" => RPL_TRYAGAIN,
    "265" => RPL_LOCALUSERS,
    "266" => RPL_GLOBALUSERS,
    "301" => RPL_AWAY,
    "302" => RPL_USERHOST,
    "303" => RPL_ISON,
    "305" => RPL_UNAWAY,
    "306" => RPL_NOWAWAY,
    "311" => RPL_WHOISUSER,
    "312" => RPL_WHOISSERVER,
    "313" => RPL_WHOISOPERATOR,
    "314" => RPL_WHOWASUSER,
    "315" => RPL_ENDOFWHO,
    "317" => RPL_WHOISIDLE,
    "318" => RPL_ENDOFWHOIS,
    "319" => RPL_WHOISCHANNELS,
    "321" => RPL_LISTSTART,
    "322" => RPL_LIST,
    "323" => RPL_LISTEND,
    "324" => RPL_CHANNELMODEIS,
    "325" => RPL_UNIQOPIS,
    "329" => RPL_CREATIONTIME,
    "330" => RPL_WHOISACCOUNT,
    "331" => RPL_NOTOPIC,
    "332" => RPL_TOPIC,
    "333" => RPL_TOPICWHOTIME,
    "341" => RPL_INVITING,
    "346" => RPL_INVITELIST,
    "347" => RPL_ENDOFINVITELIST,
    "348" => RPL_EXCEPTLIST,
    "349" => RPL_ENDOFEXCEPTLIST,
    "351" => RPL_VERSION,
    "352" => RPL_WHOREPLY,
    "353" => RPL_NAMREPLY,
    "364" => RPL_LINKS,
    "365" => RPL_ENDOFLINKS,
    "366" => RPL_ENDOFNAMES,
    "367" => RPL_BANLIST,
    "368" => RPL_ENDOFBANLIST,
    "369" => RPL_ENDOFWHOWAS,
    "371" => RPL_INFO,
    "372" => RPL_MOTD,
    "374" => RPL_ENDOFINFO,
    "375" => RPL_MOTDSTART,
    "376" => RPL_ENDOFMOTD,
    "381" => RPL_YOUREOPER,
    "382" => RPL_REHASHING,
    "391" => RPL_TIME,
    "401" => ERR_NOSUCHNICK,
    "402" => ERR_NOSUCHSERVER,
    "403" => ERR_NOSUCHCHANNEL,
    "404" => ERR_CANNOTSENDTOCHAN,
    "405" => ERR_TOOMANYCHANNELS,
    "406" => ERR_WASNOSUCHNICK,
    "407" => ERR_TOOMANYTARGETS,
    "409" => ERR_NOORIGIN,
    "411" => ERR_NORECIPIENT,
    "412" => ERR_NOTEXTTOSEND,
    "421" => ERR_UNKNOWNCOMMAND,
    "422" => ERR_NOMOTD,
    "431" => ERR_NONICKNAMEGIVEN,
    "432" => ERR_ERRONEUSNICKNAME,
    "433" => ERR_NICKNAMEINUSE,
    "436" => ERR_NICKCOLLISION,
    "437" => ERR_UNAVAILRESOURCE,
    "441" => ERR_USERNOTINCHANNEL,
    "442" => ERR_NOTONCHANNEL,
    "443" => ERR_USERONCHANNEL,
    "451" => ERR_NOTREGISTERED,
    "461" => ERR_NEEDMOREPARAMS,
    "462" => ERR_ALREADYREGISTRED,
    "464" => ERR_PASSWDMISMATCH,
    "465" => ERR_YOUREBANNEDCREEP,
    "471" => ERR_CHANNELISFULL,
    "472" => ERR_UNKNOWNMODE,
    "473" => ERR_INVITEONLYCHAN,
    "474" => ERR_BANNEDFROMCHAN,
    "475" => ERR_BADCHANNELKEY,
    "477" => ERR_NOCHANMODES,
    "478" => ERR_BANLISTFULL,
    "481" => ERR_NOPRIVILEGES,
    "482" => ERR_CHANOPRIVSNEEDED,
    "491" => ERR_NOOPERHOST,
    "501" => ERR_UMODEUNKNOWNFLAG,
    "502" => ERR_USERSDONTMATCH,
}

struct NumericTable {
    by_code: HashMap<&'static str, &'static str>,
    by_name: HashMap<&'static str, &'static str>,
}

fn table() -> &'static NumericTable {
    static TABLE: OnceLock<NumericTable> = OnceLock::new();
    TABLE.get_or_init(|| NumericTable {
        by_code: NUMERICS.iter().copied().collect(),
        by_name: NUMERICS.iter().map(|&(code, name)| (name, code)).collect(),
    })
}

/// Look up the symbolic name for a three-digit reply code
pub fn symbolic_name(code: &str) -> Option<&'static str> {
    table().by_code.get(code).copied()
}

/// Look up the reply code for a symbolic name
pub fn numeric_code(name: &str) -> Option<&'static str> {
    table().by_name.get(name).copied()
}

/// Canonical command name for a verb as received: upper-cased, and mapped to
/// its symbolic name if it's a known numeric. Unknown numerics pass through.
pub fn canonical_command(verb: &str) -> String {
    let upper = verb.to_ascii_uppercase();
    match symbolic_name(&upper) {
        Some(name) => name.to_string(),
        None => upper,
    }
}

/// The form in which a canonical command goes on the wire
pub fn wire_command(command: &str) -> &str {
    numeric_code(command).unwrap_or(command)
}
