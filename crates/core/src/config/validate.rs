use super::{types::Config, ConfigError};
use crate::matcher::PatternMatcher;
use crate::resolver::PathFormatTable;

/// Validate configuration
/// Currently validates:
/// - Category names are not empty
/// - Every pattern is a relative, well-formed glob
/// - Every path template parses
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if let Some(name) = config
        .patterns
        .keys()
        .chain(config.paths.keys())
        .find(|name| name.trim().is_empty())
    {
        return Err(ConfigError::ValidationError(format!(
            "category name cannot be empty (got {:?})",
            name
        )));
    }

    PatternMatcher::from_config(config)
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

    PathFormatTable::from_config(config)
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

    Ok(())
}
