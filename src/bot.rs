//! Transport agent process lifecycle
//!
//! The agent ("the bot") is a separate executable that performs the actual
//! network transmission. The SDK only needs three black-box operations on
//! it — start, poll, stop — and none of them is ever invoked from the
//! import/export paths.

use std::process::{Child, Command};

use crate::context::EdgeContext;
use crate::error::{Error, Result};

/// Launch configuration for one transport agent run.
#[derive(Debug, Clone, Copy)]
pub struct BotOptions {
    /// Run the low-bandwidth link.
    pub run_lb: bool,
    /// Low-bandwidth processing timeout in seconds.
    pub lb_timeout_s: u32,
    /// Run the high-bandwidth link.
    pub run_hb: bool,
    /// High-bandwidth processing timeout in seconds.
    pub hb_timeout_s: u32,
}

/// Handle to a (possibly running) transport agent process.
#[derive(Debug, Default)]
pub struct BotProcess {
    child: Option<Child>,
}

impl BotProcess {
    /// Create a handle with no process attached.
    pub fn new() -> Self {
        BotProcess::default()
    }

    /// Launch the agent executable (`bin/botmain/botmain` under the base
    /// path), passing the link configuration through its environment.
    ///
    /// Fails with [`Error::AlreadyRunning`] when this handle still owns a
    /// live process.
    pub fn start(&mut self, context: &EdgeContext, options: &BotOptions) -> Result<()> {
        if self.is_running()? {
            return Err(Error::AlreadyRunning);
        }

        let executable_dir = context.base_path().join("bin/botmain");
        let child = Command::new("./botmain")
            .current_dir(&executable_dir)
            .env_clear()
            .env("RUN_LB_LINK", if options.run_lb { "1" } else { "0" })
            .env("LB_PROC_TIMEOUT", options.lb_timeout_s.to_string())
            .env("RUN_HB_LINK", if options.run_hb { "1" } else { "0" })
            .env("HB_PROC_TIMEOUT", options.hb_timeout_s.to_string())
            .spawn()
            .map_err(|_| Error::SpawnFailed)?;

        log::debug!("transport agent started (pid {})", child.id());
        self.child = Some(child);
        Ok(())
    }

    /// Poll whether the agent is still running, without blocking.
    ///
    /// A process observed to have exited is reaped and detached from this
    /// handle.
    pub fn is_running(&mut self) -> Result<bool> {
        match &mut self.child {
            None => Ok(false),
            Some(child) => match child.try_wait() {
                Ok(None) => Ok(true),
                Ok(Some(_)) => {
                    self.child = None;
                    Ok(false)
                }
                Err(_) => Err(Error::ExecUndetermined),
            },
        }
    }

    /// Stop the agent: an interrupt by default, a hard kill when
    /// `force_kill` is set.
    pub fn stop(&mut self, force_kill: bool) -> Result<()> {
        let Some(child) = &mut self.child else {
            return Err(Error::NotRunning);
        };

        if force_kill {
            child.kill().map_err(|_| Error::KillFailed)?;
        } else {
            let pid = child.id() as libc::pid_t;
            let rc = unsafe { libc::kill(pid, libc::SIGINT) };
            if rc != 0 {
                return Err(Error::KillFailed);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_handle_is_not_running() {
        let mut bot = BotProcess::new();
        assert!(!bot.is_running().unwrap());
    }

    #[test]
    fn stop_without_start_is_an_error() {
        let mut bot = BotProcess::new();
        assert_eq!(bot.stop(false), Err(Error::NotRunning));
        assert_eq!(bot.stop(true), Err(Error::NotRunning));
    }
}
