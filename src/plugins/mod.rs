pub mod moderation;
pub mod welcome;
