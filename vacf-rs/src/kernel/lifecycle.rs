use super::ConfigError;

/// Constructor validation lifecycle shared by kernel structs.
///
/// A kernel that exists was constructed from a validated config; run-time
/// entry points only need to check per-call inputs.
pub trait KernelLifecycle: Sized {
    /// Kernel config type.
    type Config;

    /// Construct a validated kernel from config.
    fn try_new(config: Self::Config) -> Result<Self, ConfigError>;
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, KernelLifecycle};

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct DummyConfig {
        time_step: f64,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct DummyKernel {
        time_step: f64,
    }

    impl KernelLifecycle for DummyKernel {
        type Config = DummyConfig;

        fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
            if config.time_step <= 0.0 {
                return Err(ConfigError::InvalidArgument {
                    arg: "time_step",
                    reason: "time_step must be greater than zero",
                });
            }
            Ok(Self {
                time_step: config.time_step,
            })
        }
    }

    #[test]
    fn lifecycle_constructor_accepts_valid_config() {
        let kernel = DummyKernel::try_new(DummyConfig { time_step: 0.5 }).expect("valid config");
        assert_eq!(kernel.time_step, 0.5);
    }

    #[test]
    fn lifecycle_constructor_rejects_invalid_config() {
        let err = DummyKernel::try_new(DummyConfig { time_step: 0.0 }).expect_err("invalid config");
        assert_eq!(
            err,
            ConfigError::InvalidArgument {
                arg: "time_step",
                reason: "time_step must be greater than zero",
            }
        );
    }
}
