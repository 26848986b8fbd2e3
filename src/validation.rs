use anyhow::{anyhow, Result};
use chrono::{NaiveDate, NaiveTime};
use std::path::Path;

/// Validation utilities for input sanitization and edge case handling
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate a client name
    pub fn validate_client_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(anyhow!("Client name cannot be empty"));
        }

        if name.len() > 100 {
            return Err(anyhow!("Client name too long (max 100 characters)"));
        }

        // Check for potentially dangerous characters
        if name.contains('\0') || name.contains('\r') || name.contains('\n') {
            return Err(anyhow!("Client name contains invalid characters"));
        }

        Ok(())
    }

    /// Validate a job name
    pub fn validate_job_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(anyhow!("Job name cannot be empty"));
        }

        if name.len() > 200 {
            return Err(anyhow!("Job name too long (max 200 characters)"));
        }

        if name.contains('\0') {
            return Err(anyhow!("Job name contains invalid characters"));
        }

        Ok(())
    }

    /// Validate an event title
    pub fn validate_event_title(title: &str) -> Result<()> {
        if title.trim().is_empty() {
            return Err(anyhow!("Event title cannot be empty"));
        }

        if title.len() > 200 {
            return Err(anyhow!("Event title too long (max 200 characters)"));
        }

        Ok(())
    }

    /// Validate an event date in `YYYY-MM-DD` form
    pub fn validate_event_date(date: &str) -> Result<()> {
        if date.trim().is_empty() {
            return Err(anyhow!("Event date cannot be empty"));
        }

        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| anyhow!("Invalid event date: {date}. Use YYYY-MM-DD"))?;

        Ok(())
    }

    /// Validate an event time in `HH:MM` form; an empty time is allowed
    pub fn validate_event_time(time: &str) -> Result<()> {
        if time.is_empty() {
            return Ok(());
        }

        NaiveTime::parse_from_str(time, "%H:%M")
            .map_err(|_| anyhow!("Invalid event time: {time}. Use HH:MM"))?;

        Ok(())
    }

    /// Validate phone number format
    pub fn validate_phone(phone: &str) -> Result<()> {
        if phone.trim().is_empty() {
            return Ok(()); // phone is optional on client records
        }

        // Remove common formatting characters
        let cleaned = phone
            .chars()
            .filter(|c| {
                c.is_ascii_digit() || *c == '+' || *c == '-' || *c == '(' || *c == ')' || *c == ' '
            })
            .collect::<String>();

        let digits_only = cleaned.chars().filter(char::is_ascii_digit).count();

        if !(7..=15).contains(&digits_only) {
            return Err(anyhow!("Phone number must be between 7 and 15 digits"));
        }

        Ok(())
    }

    /// Validate email format
    pub fn validate_email(email: &str) -> Result<()> {
        if email.trim().is_empty() {
            return Ok(()); // email is optional on client records
        }

        if email.len() > 254 {
            return Err(anyhow!("Email too long (max 254 characters)"));
        }

        let parts: Vec<&str> = email.split('@').collect();
        if parts.len() != 2 {
            return Err(anyhow!("Email must have exactly one @ symbol"));
        }

        let local_part = parts[0];
        let domain_part = parts[1];

        if local_part.is_empty() || local_part.len() > 64 {
            return Err(anyhow!("Email local part invalid"));
        }

        if domain_part.is_empty() || !domain_part.contains('.') {
            return Err(anyhow!("Email domain invalid"));
        }

        Ok(())
    }

    /// Validate file path
    pub fn validate_file_path(path: &Path) -> Result<()> {
        if path.to_string_lossy().is_empty() {
            return Err(anyhow!("File path cannot be empty"));
        }

        // Check for path traversal attempts
        let path_str = path.to_string_lossy();
        if path_str.contains("..") {
            return Err(anyhow!(
                "File path contains potentially dangerous characters"
            ));
        }

        // Check path length
        if path_str.len() > 4096 {
            return Err(anyhow!("File path too long (max 4096 characters)"));
        }

        Ok(())
    }

    /// Sanitize text input
    #[must_use]
    pub fn sanitize_text(text: &str) -> String {
        text.chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t' || *c == '\r')
            .collect::<String>()
            .trim()
            .to_string()
    }
}
