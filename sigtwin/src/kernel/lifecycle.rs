use super::ConfigError;

/// Constructor validation lifecycle shared by kernel structs.
///
/// Every configured kernel in [`crate::signal`] is built through
/// [`KernelLifecycle::try_new`], so argument checks run once at construction
/// instead of on each call.
pub trait KernelLifecycle: Sized {
    /// Kernel config type.
    type Config;

    /// Construct a validated kernel from config.
    fn try_new(config: Self::Config) -> Result<Self, ConfigError>;
}
