pub mod detection;
pub mod registry;
pub mod types;

pub use detection::{
    contains_keywords, detect_command, detect_exact, is_menu_command, normalize, strip_emoji,
};
pub use registry::{CommandRegistry, DEFAULT_REGISTRY};
pub use types::{Command, CommandCategory, UnknownCommand};
