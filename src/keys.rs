//! Storage key names.
//!
//! Every key the app writes lives under the `@MedicalApp:` prefix.

pub const PREFIX: &str = "@MedicalApp:";

pub const USER: &str = "@MedicalApp:user";
pub const TOKEN: &str = "@MedicalApp:token";
pub const APPOINTMENTS: &str = "@MedicalApp:appointments";
pub const NOTIFICATIONS: &str = "@MedicalApp:notifications";
pub const REGISTERED_USERS: &str = "@MedicalApp:registeredUsers";
pub const APP_SETTINGS: &str = "@MedicalApp:settings";
pub const STATISTICS_CACHE: &str = "@MedicalApp:statisticsCache";

/// Key holding one stored profile image record.
pub fn profile_image(image_id: &str) -> String {
    format!("{}profileImage:{}", PREFIX, image_id)
}

/// Key holding a user's image index, newest first.
pub fn user_images(user_id: &str) -> String {
    format!("{}userImages:{}", PREFIX, user_id)
}
