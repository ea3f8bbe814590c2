//! Daemon bootstrap orchestration.
//!
//! Wires configuration, telemetry, the engine thread, and the listener
//! into a [`Bridge`] with cooperative start/stop semantics.

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use pilot_config::{Config, ConfigError};
use pilot_engine::{EngineControl, EngineThread, ShimError};

use crate::dispatch::{BridgeConnectionHandler, CommandRouter};
use crate::telemetry::TelemetryError;
use crate::transport::{ListenerError, ListenerHandle, SocketListener};

const BOOTSTRAP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::bootstrap");

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the daemon configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration fails to load.
    fn load(&self) -> Result<Config, ConfigError>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Config::load()
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        #[source]
        source: ConfigError,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        #[source]
        source: TelemetryError,
    },
    /// The listener could not bind; the whole subsystem is non-functional.
    #[error("failed to start listener: {source}")]
    Listener {
        #[source]
        source: ListenerError,
    },
    /// The engine thread died before serving a single request.
    #[error("engine unavailable at startup: {source}")]
    Engine {
        #[source]
        source: ShimError,
    },
}

/// A configured bridge: engine thread plus (once started) the listener.
pub struct Bridge {
    config: Config,
    engine_thread: Option<EngineThread>,
    router: CommandRouter,
    listener: Option<ListenerHandle>,
    local_addr: Option<SocketAddr>,
}

impl Bridge {
    /// Moves the engine onto its owning thread and prepares the router.
    ///
    /// The engine identity is captured once here so `ping` never contends
    /// for the engine thread later.
    ///
    /// # Errors
    ///
    /// [`BootstrapError::Engine`] when the engine thread cannot answer.
    pub fn new(config: Config, engine: Box<dyn EngineControl>) -> Result<Self, BootstrapError> {
        let engine_thread = EngineThread::spawn(engine);
        let handle = engine_thread.handle();
        let identity = handle
            .with_engine(|engine| engine.identity())
            .map_err(|source| BootstrapError::Engine { source })?;
        info!(
            target: BOOTSTRAP_TARGET,
            engine = %identity.engine,
            game = %identity.game,
            "engine attached"
        );
        let router = CommandRouter::new(
            handle,
            identity,
            config.state_variables.clone(),
            config.input_point,
        );
        Ok(Self {
            config,
            engine_thread: Some(engine_thread),
            router,
            listener: None,
            local_addr: None,
        })
    }

    /// Binds and starts the listener.
    ///
    /// Calling `start` while already running is a logged no-op, not an
    /// error.
    ///
    /// # Errors
    ///
    /// [`BootstrapError::Listener`] when the bind fails; this surfaces
    /// loudly since a silently-failed listener is worse than a visible one.
    pub fn start(&mut self) -> Result<(), BootstrapError> {
        if self.listener.is_some() {
            info!(target: BOOTSTRAP_TARGET, "bridge already running");
            return Ok(());
        }
        if !self.config.endpoint.is_loopback() {
            warn!(
                target: BOOTSTRAP_TARGET,
                endpoint = %self.config.endpoint,
                "binding beyond loopback widens the trust boundary"
            );
        }
        let listener = SocketListener::bind(&self.config.endpoint, self.config.max_connections)
            .map_err(|source| BootstrapError::Listener { source })?;
        self.local_addr = listener.local_addr();
        let handler = Arc::new(BridgeConnectionHandler::new(
            self.router.clone(),
            self.config.idle_timeout(),
        ));
        let handle = listener
            .start(handler)
            .map_err(|source| BootstrapError::Listener { source })?;
        self.listener = Some(handle);
        Ok(())
    }

    /// Address the listener bound, when running.
    #[must_use]
    pub const fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Signals the accept loop to stop and waits for it to exit.
    ///
    /// Connections already being served drain naturally on their own
    /// threads; calling `stop` on a stopped bridge is a no-op.
    pub fn stop(&mut self) {
        if let Some(handle) = self.listener.take() {
            handle.shutdown();
            if let Err(error) = handle.join() {
                warn!(target: BOOTSTRAP_TARGET, %error, "listener did not stop cleanly");
            }
            self.local_addr = None;
        }
    }

    /// Stops the listener and drains the engine thread.
    pub fn shutdown(mut self) {
        self.stop();
        if let Some(engine_thread) = self.engine_thread.take() {
            engine_thread.join();
        }
        info!(target: BOOTSTRAP_TARGET, "bridge stopped");
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use pilot_engine::ScriptedEngine;

    use super::*;

    fn test_config() -> Config {
        let mut config = Config::default();
        // Port 0 keeps tests free of fixed-port collisions.
        config.endpoint = pilot_config::TcpEndpoint::new("127.0.0.1", 0);
        config
    }

    #[test]
    fn start_is_idempotent() {
        let engine = Box::new(ScriptedEngine::new("Test Story"));
        let mut bridge = Bridge::new(test_config(), engine).expect("bridge");
        bridge.start().expect("first start");
        let addr = bridge.local_addr().expect("bound address");
        bridge.start().expect("second start is a no-op");
        assert_eq!(bridge.local_addr(), Some(addr));
        bridge.shutdown();
    }

    #[test]
    fn stop_then_start_rebinds() {
        let engine = Box::new(ScriptedEngine::new("Test Story"));
        let mut bridge = Bridge::new(test_config(), engine).expect("bridge");
        bridge.start().expect("start");
        bridge.stop();
        assert!(bridge.local_addr().is_none());
        bridge.start().expect("restart");
        assert!(bridge.local_addr().is_some());
        bridge.shutdown();
    }

    #[test]
    fn bind_failure_surfaces_loudly() {
        let reserved = std::net::TcpListener::bind(("127.0.0.1", 0)).expect("reserve port");
        let port = reserved.local_addr().expect("addr").port();
        let mut config = test_config();
        config.endpoint = pilot_config::TcpEndpoint::new("127.0.0.1", port);
        let engine = Box::new(ScriptedEngine::new("Test Story"));
        let mut bridge = Bridge::new(config, engine).expect("bridge");
        let error = bridge.start().expect_err("port already bound");
        assert!(matches!(error, BootstrapError::Listener { .. }));
        bridge.shutdown();
    }
}
