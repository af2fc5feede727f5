use std::str::FromStr;

/// Second positional argument of the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Command {
    /// HTTP trigger endpoints, plus the in-process cron when enabled.
    #[default]
    Serve,
    /// One pipeline run, then exit.
    Run,
    /// Reset a lock left behind by a killed run.
    ClearLock,
    /// Forget every processed match. The next run bootstraps again.
    ClearProcessed,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "serve" => Ok(Command::Serve),
            "run" => Ok(Command::Run),
            "clear-lock" => Ok(Command::ClearLock),
            "clear-processed" => Ok(Command::ClearProcessed),
            other => Err(format!(
                "unknown command `{}` (expected serve, run, clear-lock or clear-processed)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands() {
        assert_eq!("run".parse::<Command>(), Ok(Command::Run));
        assert_eq!("clear-lock".parse::<Command>(), Ok(Command::ClearLock));
        assert_eq!("clear-processed".parse::<Command>(), Ok(Command::ClearProcessed));
        assert_eq!(Command::default(), Command::Serve);
        assert!("nuke".parse::<Command>().is_err());
    }
}
