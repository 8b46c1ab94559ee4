//! The chat client's event loop.
//!
//! [`Runtime`] is the only place where the pure parts meet I/O. It feeds
//! driver events to the [`App`] and the [`Bridge`], and executes what they
//! ask for against the [`Driver`] and the [`RoomDirectory`].
//!
//! Directory calls are awaited inline. A result that comes back for a view
//! that was replaced in the meantime is discarded by the App, so the order in
//! which calls complete never matters.

use parlor_client::SocketEvent;
use parlor_core::{ConnectionConfig, Identity, ResolutionError, RoomDirectory, resolve_room};
use parlor_proto::{RoomHash, UserId};

use crate::{App, AppAction, AppEvent, Bridge, Driver, DriverEvent, TransportOp, ViewId};

/// Generic runtime that orchestrates App, Bridge, Driver and a room
/// directory.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `R`: Room directory (HTTP in production, in-memory in simulation)
pub struct Runtime<D, R>
where
    D: Driver,
    R: RoomDirectory,
{
    driver: D,
    directory: R,
    app: App,
    bridge: Bridge,
}

impl<D, R> Runtime<D, R>
where
    D: Driver,
    R: RoomDirectory,
{
    /// Create a new runtime for the local user `identity`.
    pub fn new(driver: D, directory: R, identity: Identity, config: ConnectionConfig) -> Self {
        Self { driver, directory, app: App::new(identity), bridge: Bridge::new(config) }
    }

    /// Run the main event loop until the user quits or input ends.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails to poll or render. Transport and
    /// directory failures are shown in the view instead.
    pub async fn run(mut self) -> Result<(), D::Error> {
        self.driver.render(&self.app)?;

        while !self.pump().await? {}

        self.driver.disconnect();
        Ok(())
    }

    /// Open the chat with `partner_id` and drive it as far as it goes without
    /// waiting on the socket.
    ///
    /// Returns `true` if the application should quit.
    ///
    /// # Errors
    ///
    /// Fails only if the driver fails to render.
    pub async fn activate(&mut self, partner_id: UserId) -> Result<bool, D::Error> {
        let actions = self.app.activate(partner_id);
        self.process_actions(actions).await
    }

    /// Submit message text to the current chat.
    ///
    /// # Errors
    ///
    /// Fails only if the driver fails to render.
    pub async fn submit(&mut self, content: &str) -> Result<bool, D::Error> {
        let actions = self.app.submit(content);
        self.process_actions(actions).await
    }

    /// Close the current chat and its connection.
    ///
    /// # Errors
    ///
    /// Fails only if the driver fails to render.
    pub async fn deactivate(&mut self) -> Result<bool, D::Error> {
        let actions = self.app.deactivate();
        self.process_actions(actions).await
    }

    /// Process one driver event.
    ///
    /// Returns `true` if the application should quit, either because the
    /// user asked to or because the driver has no more events.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails to poll or render.
    pub async fn pump(&mut self) -> Result<bool, D::Error> {
        let Some(event) = self.driver.poll_event().await? else {
            tracing::debug!("driver exhausted");
            return Ok(true);
        };

        match event {
            DriverEvent::Input(input) => {
                let actions = self.app.handle(AppEvent::Input(input));
                self.process_actions(actions).await
            },
            DriverEvent::Socket { socket, event } => {
                let mut events = self.bridge.handle_socket_event(socket, event);
                events.extend(self.flush_ops().await);
                self.process_bridge_events(events).await
            },
        }
    }

    /// Execute App actions, and the actions the resulting events produce,
    /// until nothing is left. `true` means quit.
    async fn process_actions(&mut self, actions: Vec<AppAction>) -> Result<bool, D::Error> {
        let mut pending = actions;

        while !pending.is_empty() {
            let actions = std::mem::take(&mut pending);

            for action in actions {
                let events = match action {
                    AppAction::Render => {
                        self.driver.render(&self.app)?;
                        continue;
                    },
                    AppAction::Quit => return Ok(true),
                    AppAction::ResolveRoom { view, self_id, partner_id } => {
                        vec![self.resolve(view, self_id, partner_id).await]
                    },
                    AppAction::LoadHistory { view, room_hash } => {
                        vec![self.load_history(view, &room_hash).await]
                    },
                    AppAction::LookupPartner { view, partner_id } => {
                        self.lookup_partner(view, partner_id).await.into_iter().collect()
                    },

                    // Connection operations go through the bridge
                    AppAction::Connect { .. }
                    | AppAction::Send { .. }
                    | AppAction::Disconnect { .. } => {
                        let mut events = self.bridge.process_app_action(action);
                        events.extend(self.flush_ops().await);
                        events
                    },
                };

                for event in events {
                    pending.extend(self.app.handle(event));
                }
            }
        }
        Ok(false)
    }

    /// Hand connection events to the App and run what follows.
    async fn process_bridge_events(&mut self, events: Vec<AppEvent>) -> Result<bool, D::Error> {
        for event in events {
            let actions = self.app.handle(event);
            if self.process_actions(actions).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn resolve(&self, view: ViewId, self_id: UserId, partner_id: UserId) -> AppEvent {
        match resolve_room(&self.directory, self_id, partner_id).await {
            Ok(room) => AppEvent::RoomResolved { view, room },
            Err(error) => AppEvent::ResolutionFailed { view, error },
        }
    }

    async fn load_history(&self, view: ViewId, room_hash: &RoomHash) -> AppEvent {
        match self.directory.history(room_hash).await {
            Ok(messages) => AppEvent::HistoryLoaded { view, messages },
            Err(e) => AppEvent::ResolutionFailed { view, error: ResolutionError::History(e) },
        }
    }

    /// The header falls back to the partner's id when this fails.
    async fn lookup_partner(&self, view: ViewId, partner_id: UserId) -> Option<AppEvent> {
        let users = match self.directory.list_users().await {
            Ok(users) => users,
            Err(e) => {
                tracing::warn!(%view, partner_id, error = %e, "partner lookup failed");
                return None;
            },
        };

        users
            .into_iter()
            .find(|u| u.id == Some(partner_id) && !u.nickname.is_empty())
            .map(|u| AppEvent::PartnerNamed { view, nickname: u.nickname })
    }

    /// Execute pending transport work.
    ///
    /// Transport errors are fed back to the bridge as socket failures, so
    /// the returned events describe them. After a failure, remaining dials
    /// and sends in the batch are dropped.
    async fn flush_ops(&mut self) -> Vec<AppEvent> {
        let mut events = Vec::new();
        let mut failed = false;

        loop {
            let ops = self.bridge.take_ops();
            if ops.is_empty() {
                break;
            }

            for op in ops {
                let result = match op {
                    TransportOp::Close { reason } => {
                        tracing::debug!(%reason, "closing socket");
                        self.driver.disconnect();
                        continue;
                    },
                    TransportOp::Dial(_) | TransportOp::Send(_) if failed => {
                        tracing::debug!(?op, "socket failed, skipping");
                        continue;
                    },
                    TransportOp::Dial(socket) => self.driver.connect(socket).await,
                    TransportOp::Send(frame) => self.driver.send_frame(frame).await,
                };

                let Err(e) = result else {
                    continue;
                };
                tracing::warn!(error = %e, "transport operation failed");
                failed = true;
                if let Some(socket) = self.bridge.socket() {
                    let reason = e.to_string();
                    events.extend(self.bridge.handle_socket_event(socket, SocketEvent::Failed { reason }));
                }
            }
        }

        events
    }

    /// Get a reference to the App
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Get a reference to the Bridge
    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    /// Get a reference to the Driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Get a mutable reference to the Driver
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Get a reference to the room directory
    pub fn directory(&self) -> &R {
        &self.directory
    }
}
