//! Membership platform adapters

mod discord;

pub use discord::DiscordPlatform;
