mod chrome;

pub use chrome::{ChromeRenderer, ChromeSettings};
