use super::{types::Config, ConfigError};

/// Validate configuration values serde cannot check on its own.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    let draft = &config.draft;
    if draft.min_turn_duration_secs == 0 {
        return Err(invalid("draft.min_turn_duration_secs must be at least 1"));
    }
    if draft.default_turn_duration_secs < draft.min_turn_duration_secs {
        return Err(ConfigError::ValidationError(format!(
            "draft.default_turn_duration_secs ({}) is below draft.min_turn_duration_secs ({})",
            draft.default_turn_duration_secs, draft.min_turn_duration_secs
        )));
    }
    if draft.max_participants == 0 {
        return Err(invalid("draft.max_participants cannot be 0"));
    }

    if config.scheduler.max_idle_ms == 0 {
        return Err(invalid("scheduler.max_idle_ms cannot be 0"));
    }
    if config.events.buffer_size == 0 {
        return Err(invalid("events.buffer_size cannot be 0"));
    }

    Ok(())
}

fn invalid(msg: &str) -> ConfigError {
    ConfigError::ValidationError(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_turn_duration_below_minimum() {
        let mut config = Config::default();
        config.draft.min_turn_duration_secs = 30;
        config.draft.default_turn_duration_secs = 10;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("default_turn_duration_secs"));
    }

    #[test]
    fn test_validate_zero_values_fail() {
        let mut config = Config::default();
        config.draft.min_turn_duration_secs = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.draft.max_participants = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.scheduler.max_idle_ms = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.events.buffer_size = 0;
        assert!(validate_config(&config).is_err());
    }
}
