use super::command::UciCommand;

pub const DEFAULT_HASH_MB: usize = 128;
pub const DEFAULT_THREADS: usize = 2;

/// A `setoption` name/value pair sent once after the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineOption {
    pub name: String,
    pub value: String,
}

impl EngineOption {
    pub fn new(name: impl Into<String>, value: impl ToString) -> Self {
        EngineOption {
            name: name.into(),
            value: value.to_string(),
        }
    }

    #[must_use]
    pub fn to_command(&self) -> UciCommand {
        UciCommand::SetOption {
            name: self.name.clone(),
            value: self.value.clone(),
        }
    }
}

/// Ordered option list. Names are compared case-insensitively, as engines do.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EngineOptions(Vec<EngineOption>);

impl EngineOptions {
    #[must_use]
    pub fn empty() -> Self {
        EngineOptions(Vec::new())
    }

    /// Set an option, replacing an earlier value under the same name.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl ToString) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl ToString) {
        let normalized = name.trim().to_ascii_lowercase();
        match self
            .0
            .iter_mut()
            .find(|opt| opt.name.to_ascii_lowercase() == normalized)
        {
            Some(existing) => existing.value = value.to_string(),
            None => self.0.push(EngineOption::new(name.trim(), value)),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        let normalized = name.trim().to_ascii_lowercase();
        self.0
            .iter()
            .find(|opt| opt.name.to_ascii_lowercase() == normalized)
            .map(|opt| opt.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &EngineOption> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions::empty()
            .with("Hash", DEFAULT_HASH_MB)
            .with("Threads", DEFAULT_THREADS)
    }
}
