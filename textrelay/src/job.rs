//! Job files for `textrelayctl send`.
//!
//! A job is a [`DispatchRequest`] written in RON, using the same field names
//! as the HTTP body:
//!
//! ```ron
//! (
//!     fromName: "Front Desk",
//!     subject: "Reminder",
//!     letter: "Your appointment is tomorrow at 3pm.",
//!     smtpConfigs: [
//!         (host: "smtp.example.com", port: 587, username: "desk", password: "secret", from: "desk@example.com"),
//!     ],
//!     usageLimits: [100],
//!     carriers: ["att", "verizon"],
//!     numbers: ["5551234567"],
//! )
//! ```

use std::path::Path;

use textrelay_common::config;
use textrelay_dispatch::DispatchRequest;

pub fn parse_job(content: &str) -> anyhow::Result<DispatchRequest> {
    Ok(ron::from_str(content)?)
}

pub fn load_job(path: &Path) -> anyhow::Result<DispatchRequest> {
    let content = config::read_config(path)?;
    parse_job(&content).map_err(|e| anyhow::anyhow!("Invalid job file {}: {e}", path.display()))
}
