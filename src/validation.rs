use crate::config::AgentConfig;
use crate::constants::*;
use crate::error::AppError;

/// Validate an app identifier.
pub fn validate_identity(field: &'static str, identity: &str) -> Result<(), AppError> {
    if identity.trim().is_empty() {
        return Err(AppError::InvalidInput {
            field,
            reason: "cannot be empty".into(),
        });
    }
    if identity.len() > MAX_IDENTITY_LEN {
        return Err(AppError::InvalidInput {
            field,
            reason: format!("cannot exceed {MAX_IDENTITY_LEN} characters"),
        });
    }
    Ok(())
}

/// Validate one orchestration delay in milliseconds.
pub fn validate_step_delay(field: &'static str, delay_ms: u64) -> Result<(), AppError> {
    if delay_ms > MAX_STEP_DELAY_MS {
        return Err(AppError::InvalidInput {
            field,
            reason: format!("cannot exceed {MAX_STEP_DELAY_MS} ms"),
        });
    }
    Ok(())
}

/// Validate an optional argv vector.
pub fn validate_command(field: &'static str, command: Option<&[String]>) -> Result<(), AppError> {
    match command {
        Some([]) => Err(AppError::InvalidInput {
            field,
            reason: "must name a program".into(),
        }),
        Some([program, ..]) if program.trim().is_empty() => Err(AppError::InvalidInput {
            field,
            reason: "program cannot be empty".into(),
        }),
        Some(_) | None => Ok(()),
    }
}

pub fn validate_config(config: &AgentConfig) -> Result<(), AppError> {
    validate_identity("self_identity", &config.self_identity)?;
    for app in &config.blocked_apps {
        validate_identity("blocked_apps", app)?;
    }

    if config.cooldown_ms == 0 {
        return Err(AppError::InvalidInput {
            field: "cooldown_ms",
            reason: "must be positive".into(),
        });
    }

    validate_step_delay("settle_delay_ms", config.settle_delay_ms)?;
    validate_step_delay("handoff_delay_ms", config.handoff_delay_ms)?;

    if !(MIN_POLL_INTERVAL_MS..=MAX_POLL_INTERVAL_MS).contains(&config.poll_interval_ms) {
        return Err(AppError::InvalidInput {
            field: "poll_interval_ms",
            reason: format!("must be between {MIN_POLL_INTERVAL_MS} and {MAX_POLL_INTERVAL_MS}"),
        });
    }

    validate_command("controller_command", config.controller_command.as_deref())?;
    validate_command("settings_command", config.settings_command.as_deref())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identity() {
        assert!(validate_identity("blocked_apps", "com.instagram.android").is_ok());
        assert!(validate_identity("blocked_apps", "").is_err());
        assert!(validate_identity("blocked_apps", "   ").is_err());
        assert!(validate_identity("blocked_apps", &"a".repeat(MAX_IDENTITY_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_step_delay() {
        assert!(validate_step_delay("settle_delay_ms", 0).is_ok());
        assert!(validate_step_delay("settle_delay_ms", MAX_STEP_DELAY_MS).is_ok());
        assert!(validate_step_delay("settle_delay_ms", MAX_STEP_DELAY_MS + 1).is_err());
    }

    #[test]
    fn test_validate_command() {
        let ok = vec!["xdg-open".to_string(), "settings://".to_string()];
        assert!(validate_command("settings_command", None).is_ok());
        assert!(validate_command("settings_command", Some(ok.as_slice())).is_ok());
        assert!(validate_command("settings_command", Some(&[][..])).is_err());
        assert!(validate_command("settings_command", Some(&[String::new()][..])).is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AgentConfig::default()).is_ok());
    }

    #[test]
    fn test_poll_interval_bounds() {
        let mut config = AgentConfig::default();
        config.poll_interval_ms = MIN_POLL_INTERVAL_MS - 1;
        assert!(validate_config(&config).is_err());
        config.poll_interval_ms = MAX_POLL_INTERVAL_MS;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_blocked_entry_rejected() {
        let mut config = AgentConfig::default();
        config.blocked_apps.push(String::new());
        assert!(matches!(
            validate_config(&config),
            Err(AppError::InvalidInput { field: "blocked_apps", .. })
        ));
    }
}
