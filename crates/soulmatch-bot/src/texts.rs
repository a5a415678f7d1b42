//! User-facing replies.

pub const WELCOME: &str = "Welcome to SoulMatch!\n\n\
Create your profile with /create_profile and start finding matches ❤️\n\
Commands: /create_profile /find /myprofile /delete_account /report /help";

pub const HELP: &str = "/create_profile - Create or update your profile\n\
/find - Browse profiles\n\
/myprofile - View your profile\n\
/delete_account - Delete your account & profile\n\
/report <tg_id> <reason> - Report a user\n\
/help - Show commands";

pub const UNKNOWN_COMMAND: &str = "Unknown command. See /help.";
pub const NOTHING_TO_SKIP: &str = "Nothing to skip right now.";

// Profile dialogue
pub const ASK_NAME: &str = "Welcome! What's your full name?";
pub const INVALID_NAME: &str = "Please enter a valid name (at least 2 characters).";
pub const ASK_AGE: &str = "How old are you?";
pub const AGE_NOT_NUMBER: &str = "Please send a number for age.";
pub const AGE_NOT_REALISTIC: &str = "That doesn't look like a real age. Please send your age in years.";
pub const UNDERAGE: &str = "You must be 18+ to use this bot.";
pub const ASK_GENDER: &str = "What's your gender? (Male/Female/Other)";
pub const ASK_BIO: &str = "Write a short bio about yourself (1-2 lines):";
pub const ASK_PHOTO: &str = "Send a profile photo or /skip to continue without one.";
pub const PROFILE_SAVED: &str = "Profile saved! Use /find to browse others.";
pub const PROFILE_SAVED_NO_PHOTO: &str = "Profile saved without photo! Use /find.";

// Discovery & matching
pub const NO_CANDIDATES: &str = "No profiles available right now. Try again later.";
pub const LIKE_BUTTON: &str = "❤️ Like";
pub const SKIP_BUTTON: &str = "⏭ Skip";
pub const ACTION_NOT_RECOGNIZED: &str = "Sorry, action not recognized. Please try /find again.";
pub const UNKNOWN_ACTION: &str = "Unknown action. Use /find to try again.";
pub const SKIPPED: &str = "Skipped! Use /find to see other profiles.";
pub const LIKE_PENDING: &str = "Liked! Waiting for a mutual like.";
pub const PROFILE_GONE: &str = "This profile is no longer available. Use /find to see others.";
pub const MATCHED: &str = "🎉 It's a MATCH! You can now chat anonymously via the bot.";
pub const MATCH_NOTIFICATION: &str = "You've got a new match! Start chatting via the bot.";

// Relay
pub const NO_ACTIVE_MATCH: &str = "You don't have an active match. Use /find to match with someone.";
pub const CONTACT_NOT_FOUND: &str = "Could not find your match's contact.";
pub const RELAYED: &str = "Sent to your match.";
pub const RELAY_FAILED: &str =
    "Failed to send message. The other user might have blocked the bot or hasn't started it.";
pub const TEXT_ONLY: &str = "Only text messages are relayed.";

// Account
pub const NO_ACCOUNT: &str = "No account found. Create one with /create_profile";
pub const NO_PROFILE: &str = "You don't have a profile yet. Create with /create_profile";
pub const ACCOUNT_DELETED: &str = "Your account and data have been deleted.";
pub const NO_ACCOUNT_TO_DELETE: &str = "No account found.";
pub const REPORT_USAGE: &str = "Usage: /report <tg_id> <reason>";
pub const REPORT_NUMERIC_ID: &str = "Provide a numeric Telegram ID.";
pub const REPORT_USER_NOT_FOUND: &str = "User not found.";
pub const REPORT_RECEIVED: &str = "Report received. Admin will review it.";
