//! Requested bind target

use std::fmt;

/// Address passed when the process should pick its own port
pub const AUTOMATIC_URL: &str = "http://127.0.0.1:0";

/// Argument introducing the bind address on the supervised program's command line
pub const URLS_ARG: &str = "--urls";

/// What the caller wants the supervised process bound to
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Target {
    /// No process should run
    #[default]
    None,
    /// Let the OS assign an ephemeral loopback port
    Automatic,
    /// Bind to this URL
    Url(String),
}

impl Target {
    /// Map a requested URL: absent means stopped, empty means automatic.
    pub fn parse(requested: Option<&str>) -> Self {
        match requested {
            None => Target::None,
            Some(url) => Target::url(url),
        }
    }

    /// Target for a URL; the empty string selects [`Target::Automatic`]
    pub fn url(url: impl Into<String>) -> Self {
        let url = url.into();
        if url.is_empty() {
            Target::Automatic
        } else {
            Target::Url(url)
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Target::None)
    }

    pub fn is_automatic(&self) -> bool {
        matches!(self, Target::Automatic)
    }

    /// Address actually handed to the process
    pub fn bind_address(&self) -> Option<&str> {
        match self {
            Target::None => None,
            Target::Automatic => Some(AUTOMATIC_URL),
            Target::Url(url) => Some(url),
        }
    }

    /// URL the caller asked for, if it named one
    pub fn requested_url(&self) -> Option<&str> {
        match self {
            Target::Url(url) => Some(url),
            _ => None,
        }
    }

    /// `--urls <address>`, or nothing for [`Target::None`]
    pub fn spawn_args(&self) -> Option<[String; 2]> {
        self.bind_address()
            .map(|address| [URLS_ARG.to_string(), address.to_string()])
    }
}

impl From<&str> for Target {
    fn from(url: &str) -> Self {
        Target::url(url)
    }
}

impl From<String> for Target {
    fn from(url: String) -> Self {
        Target::url(url)
    }
}

impl From<Option<&str>> for Target {
    fn from(requested: Option<&str>) -> Self {
        Target::parse(requested)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::None => f.write_str("(none)"),
            Target::Automatic => f.write_str("(automatic)"),
            Target::Url(url) => f.write_str(url),
        }
    }
}
