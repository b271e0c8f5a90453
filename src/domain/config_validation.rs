//! Configuration validation.
//!
//! Validates config fields before any command touches the journal.

use crate::domain::error::JournalError;
use crate::ports::config_port::ConfigPort;

pub fn validate_journal_config(config: &dyn ConfigPort) -> Result<(), JournalError> {
    validate_data_dir(config)?;
    validate_default_account(config)?;
    validate_risk_pct(config)?;
    validate_milestone_step(config)?;
    validate_trade_counts(config)?;
    validate_mirror(config)?;
    Ok(())
}

fn validate_data_dir(config: &dyn ConfigPort) -> Result<(), JournalError> {
    match config.get_string("journal", "data_dir") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(JournalError::ConfigMissing {
            section: "journal".to_string(),
            key: "data_dir".to_string(),
        }),
    }
}

fn validate_default_account(config: &dyn ConfigPort) -> Result<(), JournalError> {
    match config.get_string("journal", "default_account") {
        Some(name) => crate::domain::account::validate_account_name(&name)
            .map(|_| ())
            .map_err(|e| JournalError::ConfigInvalid {
                section: "journal".to_string(),
                key: "default_account".to_string(),
                reason: e.to_string(),
            }),
        None => Ok(()),
    }
}

fn validate_risk_pct(config: &dyn ConfigPort) -> Result<(), JournalError> {
    let value = config.get_double("risk", "risk_pct", crate::domain::risk::DEFAULT_RISK_PCT);
    if value <= 0.0 || value > 1.0 {
        return Err(JournalError::ConfigInvalid {
            section: "risk".to_string(),
            key: "risk_pct".to_string(),
            reason: "risk_pct must be greater than 0 and at most 1".to_string(),
        });
    }
    Ok(())
}

fn validate_milestone_step(config: &dyn ConfigPort) -> Result<(), JournalError> {
    let value = config.get_double(
        "risk",
        "milestone_step",
        crate::domain::risk::DEFAULT_MILESTONE_STEP,
    );
    if value <= 0.0 {
        return Err(JournalError::ConfigInvalid {
            section: "risk".to_string(),
            key: "milestone_step".to_string(),
            reason: "milestone_step must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_trade_counts(config: &dyn ConfigPort) -> Result<(), JournalError> {
    let base = config.get_int(
        "risk",
        "base_trades",
        crate::domain::risk::DEFAULT_BASE_TRADES as i64,
    );
    if base < 1 {
        return Err(JournalError::ConfigInvalid {
            section: "risk".to_string(),
            key: "base_trades".to_string(),
            reason: "base_trades must be at least 1".to_string(),
        });
    }
    let step = config.get_int(
        "risk",
        "trades_step",
        crate::domain::risk::DEFAULT_TRADES_STEP as i64,
    );
    if step < 0 {
        return Err(JournalError::ConfigInvalid {
            section: "risk".to_string(),
            key: "trades_step".to_string(),
            reason: "trades_step must be non-negative".to_string(),
        });
    }
    Ok(())
}

fn validate_mirror(config: &dyn ConfigPort) -> Result<(), JournalError> {
    if !config.get_bool("mirror", "enabled", false) {
        return Ok(());
    }
    match config.get_string("mirror", "path") {
        Some(s) if !s.trim().is_empty() => {}
        _ => {
            return Err(JournalError::ConfigMissing {
                section: "mirror".to_string(),
                key: "path".to_string(),
            })
        }
    }
    if let Some(policy) = config.get_string("mirror", "merge_policy") {
        policy.parse::<crate::domain::merge::MergePolicy>()?;
    }
    Ok(())
}
