/// One line of interactive chat input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Send a text message to the other participant.
    Send(String),
    /// Fetch the next (older) page of history.
    LoadOlder,
    Quit,
}

impl ChatCommand {
    /// Returns `None` for blank input.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        match line {
            "" => None,
            "/older" | "/more" => Some(Self::LoadOlder),
            "/quit" | "/exit" => Some(Self::Quit),
            text => Some(Self::Send(text.to_string())),
        }
    }
}
