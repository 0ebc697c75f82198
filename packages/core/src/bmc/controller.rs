//! Power and boot-media actions
//!
//! The ISO boot sequence is retried as a whole. Within one attempt, a
//! failed eject is expected (nothing mounted) and only logged, while a
//! failed insert or boot-override aborts the attempt.

use std::thread;
use std::time::Duration;

use super::descriptor::BmcDescriptor;
use super::error::BmcError;
use super::redfish::{RedfishClient, RedfishPaths};
use crate::host::{Connector, LivenessProbe, RemoteHost};
use crate::retry::RetryPolicy;

/// Management-controller operations the controller needs
pub trait BmcClient {
    /// Address used in logs and errors
    fn address(&self) -> &str;
    fn eject_media(&self) -> Result<(), BmcError>;
    fn insert_media(&self, image: &str) -> Result<(), BmcError>;
    /// Boot from the inserted media on the next boot only
    fn set_boot_once(&self) -> Result<(), BmcError>;
    fn restart(&self) -> Result<(), BmcError>;
    fn power_off(&self) -> Result<(), BmcError>;
    fn power_on(&self) -> Result<(), BmcError>;
}

/// Timing of power and boot actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerOptions {
    /// Whole-sequence retry for `boot_iso` (default: 10 attempts, 60s apart)
    pub boot_retry: RetryPolicy,
    /// Wait after issuing the restart
    pub settle: Duration,
    /// Wait between power-off and power-on in `cold_boot`
    pub off_delay: Duration,
    /// Wait after power-on in `cold_boot`
    pub on_delay: Duration,
}

impl Default for PowerOptions {
    fn default() -> Self {
        Self {
            boot_retry: RetryPolicy::bounded(10, Duration::from_secs(60)),
            settle: Duration::from_secs(10),
            off_delay: Duration::from_secs(10),
            on_delay: Duration::from_secs(5),
        }
    }
}

/// Drives one node's BMC; holds no SSH state
pub struct PowerController<C: BmcClient = RedfishClient> {
    client: C,
    options: PowerOptions,
}

impl PowerController {
    /// Controller talking Redfish to `descriptor`
    pub fn redfish(
        descriptor: BmcDescriptor,
        paths: RedfishPaths,
        request_timeout: Duration,
        options: PowerOptions,
    ) -> Result<Self, BmcError> {
        let client = RedfishClient::new(descriptor, paths, request_timeout)?;
        Ok(Self::new(client, options))
    }
}

impl<C: BmcClient> PowerController<C> {
    pub fn new(client: C, options: PowerOptions) -> Self {
        Self { client, options }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn address(&self) -> &str {
        self.client.address()
    }

    /// Make the node boot once from `iso` and restart it
    pub fn boot_iso(&self, iso: &str) -> Result<(), BmcError> {
        self.options
            .boot_retry
            .retry("boot from ISO", |attempt| self.boot_attempt(iso, attempt))
            .map_err(|e| BmcError::BootExhausted {
                address: self.address().to_string(),
                attempts: e.attempts,
                last: e.last.to_string(),
            })
    }

    fn boot_attempt(&self, iso: &str, attempt: u32) -> Result<(), BmcError> {
        tracing::info!(
            "Trying to boot through {} (attempt {})",
            self.address(),
            attempt
        );

        if let Err(e) = self.client.eject_media() {
            tracing::info!("eject failed, but continuing: {}", e);
        }

        self.client.insert_media(iso)?;
        tracing::info!("inserted iso {}", iso);

        self.client.set_boot_once()?;
        tracing::info!("set to boot from iso once");

        self.client.restart()?;
        pause(self.options.settle);
        tracing::info!("Finished sending boot to {}", self.address());
        Ok(())
    }

    /// Force power off; no retry
    pub fn stop(&self) -> Result<(), BmcError> {
        tracing::info!("Powering off through {}", self.address());
        self.client.power_off()
    }

    /// Power on; no retry
    pub fn start(&self) -> Result<(), BmcError> {
        tracing::info!("Powering on through {}", self.address());
        self.client.power_on()
    }

    /// Stop, wait, start, wait
    ///
    /// Not atomic: if `start` fails the node stays off.
    pub fn cold_boot(&self) -> Result<(), BmcError> {
        self.stop()?;
        pause(self.options.off_delay);
        self.start()?;
        pause(self.options.on_delay);
        Ok(())
    }
}

/// Boot `iso` out of band, then wait for the node and open SSH as `username`
pub fn boot_iso_and_connect<B, C, P>(
    host: &mut RemoteHost<C, P>,
    controller: &PowerController<B>,
    iso: &str,
    username: &str,
) -> Result<(), BmcError>
where
    B: BmcClient,
    C: Connector,
    P: LivenessProbe,
{
    host.close();
    controller.boot_iso(iso)?;
    host.ssh_connect(username)?;
    Ok(())
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;
    use crate::host::{
        CommandResult, ConnectError, Credential, KeyPaths, RemoteOptions, Session, SessionError,
        SessionState, SshTarget,
    };

    type CallLog = Rc<RefCell<Vec<&'static str>>>;

    /// Scripted BMC recording every call
    #[derive(Default)]
    struct FakeBmc {
        eject_always_fails: bool,
        insert_failures: Cell<u32>,
        boot_once_fails: bool,
        power_on_fails: bool,
        calls: CallLog,
    }

    impl FakeBmc {
        fn count(&self, call: &str) -> usize {
            self.calls.borrow().iter().filter(|c| **c == call).count()
        }

        fn record(&self, call: &'static str) {
            self.calls.borrow_mut().push(call);
        }
    }

    fn refused(what: &str) -> BmcError {
        BmcError::Http {
            address: "10.0.0.2".to_string(),
            status: 500,
            body: format!("{what} refused"),
        }
    }

    impl BmcClient for FakeBmc {
        fn address(&self) -> &str {
            "10.0.0.2"
        }

        fn eject_media(&self) -> Result<(), BmcError> {
            self.record("eject");
            if self.eject_always_fails {
                return Err(refused("eject"));
            }
            Ok(())
        }

        fn insert_media(&self, _image: &str) -> Result<(), BmcError> {
            self.record("insert");
            let remaining = self.insert_failures.get();
            if remaining > 0 {
                self.insert_failures.set(remaining - 1);
                return Err(refused("insert"));
            }
            Ok(())
        }

        fn set_boot_once(&self) -> Result<(), BmcError> {
            self.record("boot_once");
            if self.boot_once_fails {
                return Err(refused("boot override"));
            }
            Ok(())
        }

        fn restart(&self) -> Result<(), BmcError> {
            self.record("restart");
            Ok(())
        }

        fn power_off(&self) -> Result<(), BmcError> {
            self.record("off");
            Ok(())
        }

        fn power_on(&self) -> Result<(), BmcError> {
            self.record("on");
            if self.power_on_fails {
                return Err(refused("power on"));
            }
            Ok(())
        }
    }

    fn fast() -> PowerOptions {
        PowerOptions {
            boot_retry: RetryPolicy::bounded(10, Duration::ZERO),
            settle: Duration::ZERO,
            off_delay: Duration::ZERO,
            on_delay: Duration::ZERO,
        }
    }

    #[test]
    fn boot_runs_full_sequence_in_order() {
        let controller = PowerController::new(FakeBmc::default(), fast());
        controller.boot_iso("http://lab/rhcos.iso").unwrap();
        assert_eq!(
            *controller.client().calls.borrow(),
            vec!["eject", "insert", "boot_once", "restart"]
        );
    }

    #[test]
    fn eject_failure_is_swallowed() {
        let bmc = FakeBmc {
            eject_always_fails: true,
            ..FakeBmc::default()
        };
        let controller = PowerController::new(bmc, fast());

        controller.boot_iso("http://lab/rhcos.iso").unwrap();
        assert_eq!(controller.client().count("restart"), 1);
        assert_eq!(controller.client().count("eject"), 1);
    }

    #[test]
    fn insert_failures_retry_whole_sequence() {
        let bmc = FakeBmc {
            insert_failures: Cell::new(3),
            ..FakeBmc::default()
        };
        let controller = PowerController::new(bmc, fast());

        controller.boot_iso("http://lab/rhcos.iso").unwrap();

        let bmc = controller.client();
        assert_eq!(bmc.count("insert"), 4);
        assert_eq!(bmc.count("eject"), 4);
        assert_eq!(bmc.count("restart"), 1);
    }

    #[test]
    fn boot_override_failure_aborts_attempt() {
        let bmc = FakeBmc {
            boot_once_fails: true,
            ..FakeBmc::default()
        };
        let options = PowerOptions {
            boot_retry: RetryPolicy::bounded(3, Duration::ZERO),
            ..fast()
        };
        let controller = PowerController::new(bmc, options);

        let err = controller.boot_iso("http://lab/rhcos.iso").unwrap_err();

        match err {
            BmcError::BootExhausted {
                address,
                attempts,
                last,
            } => {
                assert_eq!(address, "10.0.0.2");
                assert_eq!(attempts, 3);
                assert!(last.contains("boot override refused"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(controller.client().count("restart"), 0);
    }

    #[test]
    fn cold_boot_stops_then_starts() {
        let controller = PowerController::new(FakeBmc::default(), fast());
        controller.cold_boot().unwrap();
        assert_eq!(*controller.client().calls.borrow(), vec!["off", "on"]);
    }

    #[test]
    fn power_failures_are_not_retried() {
        let bmc = FakeBmc {
            power_on_fails: true,
            ..FakeBmc::default()
        };
        let controller = PowerController::new(bmc, fast());

        assert!(controller.start().is_err());
        assert!(controller.cold_boot().is_err());
        assert_eq!(controller.client().count("on"), 2);
        assert_eq!(controller.client().count("off"), 1);
    }

    /// SSH side of the flow, writing into the same log as the BMC
    struct LoggingConnector {
        log: CallLog,
    }

    struct LoggingSession {
        log: CallLog,
    }

    impl Connector for LoggingConnector {
        type Session = LoggingSession;

        fn connect(
            &self,
            _target: &SshTarget,
            _username: &str,
            _credential: &Credential,
        ) -> Result<LoggingSession, ConnectError> {
            self.log.borrow_mut().push("connect");
            Ok(LoggingSession {
                log: Rc::clone(&self.log),
            })
        }
    }

    impl Session for LoggingSession {
        fn exec(
            &mut self,
            _command: &str,
            _stdin: Option<&[u8]>,
            _on_line: &mut dyn FnMut(&str),
        ) -> Result<CommandResult, SessionError> {
            Ok(CommandResult::new("", "", 0))
        }

        fn close(&mut self) {
            self.log.borrow_mut().push("session_close");
        }
    }

    struct LoggingProbe {
        log: CallLog,
        misses: Rc<Cell<u32>>,
    }

    impl LivenessProbe for LoggingProbe {
        fn is_alive(&self, _address: &str) -> bool {
            self.log.borrow_mut().push("ping");
            let misses = self.misses.get();
            if misses > 0 {
                self.misses.set(misses - 1);
                return false;
            }
            true
        }
    }

    /// Host already connected once; the returned cell sets how many pings
    /// miss before the node answers again
    fn connected_host(
        log: &CallLog,
        keys: &tempfile::TempDir,
    ) -> (RemoteHost<LoggingConnector, LoggingProbe>, Rc<Cell<u32>>) {
        let misses = Rc::new(Cell::new(0));
        let primary = keys.path().join("id_rsa");
        let fallback = keys.path().join("id_ed25519");
        std::fs::write(&primary, "rsa key").unwrap();

        let mut host = RemoteHost::with_parts(
            SshTarget::new("10.0.0.1"),
            LoggingConnector {
                log: Rc::clone(log),
            },
            LoggingProbe {
                log: Rc::clone(log),
                misses: Rc::clone(&misses),
            },
            RemoteOptions {
                connect_retry: RetryPolicy::unbounded(Duration::ZERO),
                probe_interval: Duration::ZERO,
                key_paths: KeyPaths::with_overrides(Some(&primary), Some(&fallback)),
            },
        );
        host.ssh_connect("core").unwrap();
        log.borrow_mut().clear();
        (host, misses)
    }

    #[test]
    fn boot_and_connect_closes_boots_waits_then_connects() {
        let log = CallLog::default();
        let keys = tempfile::tempdir().unwrap();
        let (mut host, misses) = connected_host(&log, &keys);
        let bmc = FakeBmc {
            calls: Rc::clone(&log),
            ..FakeBmc::default()
        };
        let controller = PowerController::new(bmc, fast());

        // Node is still down right after the restart
        misses.set(1);
        boot_iso_and_connect(&mut host, &controller, "http://lab/rhcos.iso", "core").unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                "session_close",
                "eject",
                "insert",
                "boot_once",
                "restart",
                "ping",
                "ping",
                "connect"
            ]
        );
        assert_eq!(host.state(), SessionState::Connected);
        assert_eq!(host.username(), Some("core"));
    }

    #[test]
    fn boot_failure_skips_connect() {
        let log = CallLog::default();
        let keys = tempfile::tempdir().unwrap();
        let (mut host, _misses) = connected_host(&log, &keys);
        let bmc = FakeBmc {
            boot_once_fails: true,
            calls: Rc::clone(&log),
            ..FakeBmc::default()
        };
        let options = PowerOptions {
            boot_retry: RetryPolicy::bounded(2, Duration::ZERO),
            ..fast()
        };
        let controller = PowerController::new(bmc, options);

        let err = boot_iso_and_connect(&mut host, &controller, "http://lab/rhcos.iso", "core")
            .unwrap_err();

        assert!(matches!(err, BmcError::BootExhausted { attempts: 2, .. }));
        let log = log.borrow();
        assert_eq!(log.first(), Some(&"session_close"));
        assert!(!log.contains(&"ping"));
        assert!(!log.contains(&"connect"));
        assert_eq!(host.state(), SessionState::Disconnected);
    }
}
