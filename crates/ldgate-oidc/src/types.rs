//! Protocol parameter types.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// One `response_type` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ResponseType {
    /// Authorization code.
    Code,
    /// Access token (implicit).
    Token,
    /// ID token (implicit).
    IdToken,
}

impl FromStr for ResponseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "code" => Ok(Self::Code),
            "token" => Ok(Self::Token),
            "id_token" => Ok(Self::IdToken),
            _ => Err(format!("unknown response type: {s}")),
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Code => "code",
            Self::Token => "token",
            Self::IdToken => "id_token",
        };
        write!(f, "{s}")
    }
}

/// The whitespace-separated `response_type` set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseTypeSet(BTreeSet<ResponseType>);

impl ResponseTypeSet {
    /// Whether a code is requested.
    #[must_use]
    pub fn has_code(&self) -> bool {
        self.0.contains(&ResponseType::Code)
    }

    /// Whether an access token is requested.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.0.contains(&ResponseType::Token)
    }

    /// Whether an ID token is requested.
    #[must_use]
    pub fn has_id_token(&self) -> bool {
        self.0.contains(&ResponseType::IdToken)
    }

    /// Whether results default to the URL fragment.
    #[must_use]
    pub fn requires_fragment(&self) -> bool {
        self.has_token() || self.has_id_token()
    }
}

impl FromStr for ResponseTypeSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut set = BTreeSet::new();
        for part in s.split_whitespace() {
            set.insert(ResponseType::from_str(part)?);
        }
        if set.is_empty() {
            return Err("response_type is empty".to_string());
        }
        Ok(Self(set))
    }
}

/// Where result parameters are placed on the redirect URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// Query string parameters.
    Query,
    /// URL fragment parameters.
    Fragment,
}

impl ResponseMode {
    /// The default mode for a raw `response_type` value: fragment whenever
    /// it names `token` or `id_token`, query otherwise.
    #[must_use]
    pub fn default_for(raw_response_type: &str) -> Self {
        let fragment = raw_response_type
            .split_whitespace()
            .any(|part| part == "token" || part == "id_token");
        if fragment {
            Self::Fragment
        } else {
            Self::Query
        }
    }
}

impl FromStr for ResponseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "query" => Ok(Self::Query),
            "fragment" => Ok(Self::Fragment),
            _ => Err(format!("unsupported response mode: {s}")),
        }
    }
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => write!(f, "query"),
            Self::Fragment => write!(f, "fragment"),
        }
    }
}

/// One `prompt` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Prompt {
    /// No UI may be shown.
    None,
    /// Force re-authentication.
    Login,
    /// Force the consent step.
    Consent,
    /// Force account selection.
    SelectAccount,
}

/// The whitespace-separated `prompt` set. Unknown values are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptSet(BTreeSet<Prompt>);

impl PromptSet {
    /// Parses the raw parameter.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let set = raw
            .split_whitespace()
            .filter_map(|part| match part {
                "none" => Some(Prompt::None),
                "login" => Some(Prompt::Login),
                "consent" => Some(Prompt::Consent),
                "select_account" => Some(Prompt::SelectAccount),
                _ => None,
            })
            .collect();
        Self(set)
    }

    /// Whether `none` is present.
    #[must_use]
    pub fn has_none(&self) -> bool {
        self.0.contains(&Prompt::None)
    }

    /// Whether `login` is present.
    #[must_use]
    pub fn has_login(&self) -> bool {
        self.0.contains(&Prompt::Login)
    }

    /// Whether `none` appears alongside other values.
    #[must_use]
    pub fn none_conflicts(&self) -> bool {
        self.has_none() && self.0.len() > 1
    }
}

/// PKCE code challenge methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeChallengeMethod {
    /// The verifier is the challenge.
    Plain,
    /// SHA-256 of the verifier, base64url encoded.
    S256,
}

impl CodeChallengeMethod {
    /// Canonical wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::S256 => "S256",
        }
    }
}

impl FromStr for CodeChallengeMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(Self::Plain),
            "S256" => Ok(Self::S256),
            _ => Err(format!("unknown code challenge method: {s}")),
        }
    }
}
