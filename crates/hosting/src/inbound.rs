use parlay_core::Credits;
use parlay_core::ID;
use parlay_dispatch::Target;
use parlay_gameroom::*;

/// A button press relayed by the platform adapter.
/// `data` is the machine callback payload we attached to the button when the
/// surface was rendered: `<session-uuid>/<verb>[/<argument>]`. Free-text chat
/// parsing stays in the adapter; only structured payloads reach this layer.
#[derive(Clone, Debug)]
pub struct ButtonPress {
    pub user: ID<Member>,
    pub target: Target,
    pub data: String,
}

/// A structured request to open a session, already parsed by the adapter.
#[derive(Clone, Debug)]
pub struct OpenRequest {
    pub user: ID<Member>,
    pub target: Target,
    pub variant: Variant,
    pub stake: Credits,
}

/// Malformed callback payloads.
/// These indicate a buggy or forged client, not a user mistake, so they are
/// surfaced to the adapter instead of becoming a polite rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundError {
    MissingSession,
    BadSession(String),
    UnknownVerb(String),
    BadArgument(String),
}

impl std::fmt::Display for InboundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingSession => write!(f, "callback data has no session id"),
            Self::BadSession(s) => write!(f, "malformed session id: {}", s),
            Self::UnknownVerb(v) => write!(f, "unknown verb: {}", v),
            Self::BadArgument(a) => write!(f, "bad argument: {}", a),
        }
    }
}

impl std::error::Error for InboundError {}

impl TryFrom<ButtonPress> for Command {
    type Error = InboundError;
    fn try_from(press: ButtonPress) -> Result<Self, Self::Error> {
        let mut parts = press.data.splitn(3, '/');
        let session = parts.next().ok_or(InboundError::MissingSession)?;
        let session = session
            .parse::<uuid::Uuid>()
            .map_err(|_| InboundError::BadSession(session.to_string()))?
            .into();
        let verb = parts.next().unwrap_or_default();
        let argument = parts.next();
        let action = match (verb, argument) {
            ("join", None) => Action::Join,
            ("confirm", None) => Action::Confirm,
            ("extend", None) => Action::Extend,
            ("cancel", None) => Action::Cancel,
            ("continue", None) => Action::Continue,
            ("spin", None) => Action::Spin,
            ("choose", Some("1x1")) => Action::Choose(Format::Single),
            ("choose", Some("3x1")) => Action::Choose(Format::Triple),
            ("choose", Some("3x3")) => Action::Choose(Format::Grid),
            ("vote", Some("yes")) => Action::Vote(Choice::Yes),
            ("vote", Some("no")) => Action::Vote(Choice::No),
            ("choose", Some(a)) | ("vote", Some(a)) => {
                return Err(InboundError::BadArgument(a.to_string()));
            }
            (v, _) => return Err(InboundError::UnknownVerb(v.to_string())),
        };
        Ok(Command::Act {
            session,
            actor: press.user,
            action,
        })
    }
}

impl From<OpenRequest> for Command {
    fn from(request: OpenRequest) -> Self {
        Command::Open {
            creator: request.user,
            variant: request.variant,
            stake: request.stake,
            target: request.target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(data: &str) -> ButtonPress {
        ButtonPress {
            user: ID::default(),
            target: Target::Inline { id: "t".into() },
            data: data.to_string(),
        }
    }
    fn session() -> String {
        uuid::Uuid::now_v7().to_string()
    }

    #[test]
    fn verbs_convert_to_actions() {
        let id = session();
        for (data, expect) in [
            (format!("{}/join", id), "join"),
            (format!("{}/spin", id), "spin"),
            (format!("{}/choose/3x3", id), "choose 3x3"),
            (format!("{}/vote/yes", id), "vote yes"),
        ] {
            let command = Command::try_from(press(&data)).unwrap();
            let Command::Act { action, .. } = command else {
                panic!("expected act");
            };
            assert_eq!(action.to_string(), expect);
        }
    }

    #[test]
    fn malformed_payloads_are_refused() {
        let id = session();
        assert_eq!(
            Command::try_from(press("not-a-uuid/join")),
            Err(InboundError::BadSession("not-a-uuid".into()))
        );
        assert_eq!(
            Command::try_from(press(&format!("{}/teleport", id))),
            Err(InboundError::UnknownVerb("teleport".into()))
        );
        assert_eq!(
            Command::try_from(press(&format!("{}/vote/maybe", id))),
            Err(InboundError::BadArgument("maybe".into()))
        );
    }
}
