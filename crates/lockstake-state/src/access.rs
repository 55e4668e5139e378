use lockstake_core::config::GlobalConfig;
use lockstake_core::error::StakeError;
use lockstake_core::types::AccountId;

/// Owner gate over a [`GlobalConfig`].
///
/// Ownership moves in a single step; there is no pending-acceptance phase.
pub struct AccessControl<'a> {
    config: &'a mut GlobalConfig,
}

impl<'a> AccessControl<'a> {
    pub fn new(config: &'a mut GlobalConfig) -> Self {
        Self { config }
    }

    pub fn require_owner(&self, caller: &AccountId) -> Result<(), StakeError> {
        require_owner(self.config, caller)
    }

    pub fn transfer_ownership(
        &mut self,
        caller: &AccountId,
        new_owner: AccountId,
    ) -> Result<(), StakeError> {
        self.require_owner(caller)?;
        if new_owner.is_null() {
            return Err(StakeError::InvalidOwner);
        }
        self.config.owner = new_owner;
        Ok(())
    }

    pub fn set_annual_interest_percent(
        &mut self,
        caller: &AccountId,
        value: u64,
    ) -> Result<(), StakeError> {
        self.require_owner(caller)?;
        self.config.annual_interest_percent = value;
        Ok(())
    }

    pub fn set_max_duration(&mut self, caller: &AccountId, value: u64) -> Result<(), StakeError> {
        self.require_owner(caller)?;
        if value == 0 {
            return Err(StakeError::ZeroDuration);
        }
        self.config.max_duration = value;
        Ok(())
    }
}

/// Fails with `Unauthorized` unless `caller` is the configured owner.
pub fn require_owner(config: &GlobalConfig, caller: &AccountId) -> Result<(), StakeError> {
    if *caller != config.owner {
        return Err(StakeError::Unauthorized);
    }
    Ok(())
}
