use std::time;

pub static SMALL_DELAY: time::Duration = time::Duration::from_millis(200);

pub static PORT: &str = "5087";
pub static ADDR: &str = "127.0.0.1:5087";

pub static WELCOME_THREAD: &str = "0000000000000001";
pub static WELCOME_ID: &str = "welcome@example.tld";
pub static REPLY_ID: &str = "welcome-reply@example.tld";
