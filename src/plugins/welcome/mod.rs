pub mod cache;
pub mod command;
pub mod diff;
pub mod notify;
pub mod poll;
pub mod settings;

pub use cache::{GroupCache, GroupSnapshot, Refreshed};
pub use command::on_command;
pub use diff::{diff, MembershipDelta};
pub use notify::{MemberEvent, MemberEventKind, Notifier};
pub use poll::PollLoop;
pub use settings::{Settings, SettingsError, SettingsStore};

pub const PREFIX: &str = "!wl";

pub const USAGE: &str = "➜ Please specify [on/off] after !wl 🤗\n➜ Example: !wl on or !wl off ✅";
pub const OWNER_ONLY: &str = "➜ This command is only available to the owner 🤗";
pub const GROUP_ONLY: &str = "➜ This command only works in groups 🤗";
pub const ENABLED: &str = "🚦 Welcome mode is now 🟢 ON 🎉";
pub const DISABLED: &str = "🚦 Welcome mode is now 🔴 OFF 🎉";
pub const NOT_CONFIGURED: &str = "🚦 This group has no welcome configuration to 🔴 turn off 🤗";
pub const SAVE_FAILED: &str = "➜ Could not save welcome settings, please check the logs 🤗";

pub fn unsupported(arg: &str) -> String {
    format!("➜ Command !wl {arg} is not supported 🤗")
}

pub fn welcome_caption(name: &str, group: &str) -> String {
    format!("🥳 Welcome {name} 🎉 to {group}")
}

pub fn welcome_text(name: &str, group: &str, total: u64) -> String {
    format!("Welcome {name} to {group}! You are member number {total}.")
}

pub fn farewell_caption(name: &str) -> String {
    format!("💔 Goodbye {name} 🤧")
}

pub fn farewell_text(name: &str) -> String {
    format!("Goodbye {name}. Wishing you the best of luck 🤑!")
}
