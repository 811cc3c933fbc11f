use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
pub enum CollectionKind {
    Configs, // Serialized task requests
    Outputs, // Result tables written by the crawler notebook
}

impl CollectionKind {
    pub fn default_dir(&self) -> &'static str {
        match self {
            CollectionKind::Configs => "configs",
            CollectionKind::Outputs => "outputs",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_dir())
    }
}
