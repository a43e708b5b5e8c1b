//! [`CivicService`]: the authoritative store and its command surface.
//!
//! Within one instance, commands are applied one at a time in call order.
//! Each mutating command runs the same pipeline: mutate the in-memory store,
//! persist the whole snapshot, post it on the same-device channel, push it to
//! every open peer, then notify subscribers.
//!
//! If persistence fails the command returns the error with the in-memory
//! store already mutated and nothing replicated.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, Weak};

use civic_core::{
  announcement::Announcement,
  audit::{AuditAction, AuditLogEntry},
  database::Database,
  event::StoreEvent,
  ports::{Clock, IdGenerator, KeyValueStore, MergeStrategy, ReplaceAll, SystemClock, TimestampIds},
  report::{DetailedReport, NewReport, ReportPatch},
  sos::{SosAlert, SosStatus},
  user::{NewUser, Role, User},
  wire::{PeerMessage, TabMessage},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  Error, Result, SyncConfig,
  peer::{Advertisement, ConnectionState, PeerConnection, PeerLink, Signaling},
  persistence::SnapshotStore,
  subscribers::{Subscribers, Subscription},
  tab::{Origin, TabChannel, TabReceiver},
};

/// Where an inbound snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicationSource {
  /// Another instance on the same device. Not persisted: the sender already
  /// wrote the shared storage.
  SameDevice,
  /// A peer overlay connection. Persisted locally.
  Peer,
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Collects the injected dependencies of a [`CivicService`].
pub struct ServiceBuilder<K> {
  kv:     K,
  config: SyncConfig,
  clock:  Arc<dyn Clock>,
  ids:    Arc<dyn IdGenerator>,
  merge:  Arc<dyn MergeStrategy>,
  origin: Option<Origin>,
}

impl<K: KeyValueStore> ServiceBuilder<K> {
  pub fn config(mut self, config: SyncConfig) -> Self {
    self.config = config;
    self
  }

  pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  pub fn ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
    self.ids = ids;
    self
  }

  pub fn merge(mut self, merge: Arc<dyn MergeStrategy>) -> Self {
    self.merge = merge;
    self
  }

  /// Join the same-device channel named by the config on `origin`.
  pub fn origin(mut self, origin: Origin) -> Self {
    self.origin = Some(origin);
    self
  }

  /// Load (or seed) the store and start listening on the same-device channel.
  ///
  /// Must be called from within a tokio runtime.
  pub async fn open(self) -> Result<CivicService<K>> {
    let persistence = SnapshotStore::new(self.kv, self.config.storage_key.clone());
    let db = persistence.load_or_seed(self.clock.now()).await?;
    let (reports, sos) = (db.reports.len(), db.sos.len());

    let tab = self.origin.map(|o| o.channel(&self.config.tab_channel));
    let tab_rx = tab.as_ref().map(TabChannel::subscribe);
    if let Some(tab) = &tab {
      debug!(channel = tab.name(), "joined same-device channel");
    }

    let service = CivicService {
      inner: Arc::new(Inner {
        db: RwLock::new(db),
        gate: tokio::sync::Mutex::new(()),
        persistence,
        tab,
        peers: Mutex::new(Vec::new()),
        subscribers: Subscribers::new(),
        cloud: Mutex::new(None),
        clock: self.clock,
        ids: self.ids,
        merge: self.merge,
        config: self.config,
      }),
    };

    if let Some(rx) = tab_rx {
      tokio::spawn(pump_same_device(Arc::downgrade(&service.inner), rx));
    }

    info!(reports, sos, "store opened");
    Ok(service)
  }
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// The overlay identity this instance established.
#[derive(Debug, Clone)]
struct CloudIdentity {
  id:   String,
  role: Role,
}

struct Inner<K> {
  db:          RwLock<Database>,
  // Serialises commands and inbound snapshots across their persistence await.
  gate:        tokio::sync::Mutex<()>,
  persistence: SnapshotStore<K>,
  tab:         Option<TabChannel>,
  peers:       Mutex<Vec<Arc<PeerConnection>>>,
  subscribers: Subscribers,
  cloud:       Mutex<Option<CloudIdentity>>,
  clock:       Arc<dyn Clock>,
  ids:         Arc<dyn IdGenerator>,
  merge:       Arc<dyn MergeStrategy>,
  config:      SyncConfig,
}

/// The authoritative store of one instance.
///
/// Clones share the same store.
pub struct CivicService<K> {
  inner: Arc<Inner<K>>,
}

impl<K> Clone for CivicService<K> {
  fn clone(&self) -> Self { Self { inner: self.inner.clone() } }
}

impl<K: KeyValueStore> CivicService<K> {
  pub fn builder(kv: K) -> ServiceBuilder<K> {
    ServiceBuilder {
      kv,
      config: SyncConfig::default(),
      clock: Arc::new(SystemClock),
      ids: Arc::new(TimestampIds::new()),
      merge: Arc::new(ReplaceAll),
      origin: None,
    }
  }

  fn read(&self) -> RwLockReadGuard<'_, Database> {
    self.inner.db.read().unwrap_or_else(PoisonError::into_inner)
  }

  /// Apply `f` to the store under the write lock and return its result along
  /// with a copy of the resulting snapshot.
  fn mutate<T>(&self, f: impl FnOnce(&mut Database) -> T) -> (T, Database) {
    let mut db = self.inner.db.write().unwrap_or_else(PoisonError::into_inner);
    let out = f(&mut db);
    (out, db.clone())
  }

  pub fn config(&self) -> &SyncConfig { &self.inner.config }

  pub fn storage(&self) -> &K { self.inner.persistence.kv() }

  // ── Reads ─────────────────────────────────────────────────────────────

  /// A copy of the whole store.
  pub fn snapshot(&self) -> Database { self.read().clone() }

  /// Reports, newest first. The returned vector is a copy.
  pub fn reports(&self) -> Vec<DetailedReport> { self.read().reports.clone() }

  /// SOS alerts, newest first. The returned vector is a copy.
  pub fn sos_alerts(&self) -> Vec<SosAlert> { self.read().sos.clone() }

  pub fn announcements(&self) -> Vec<Announcement> { self.read().announcements.clone() }

  /// Find the user with `identifier` (email, phone or national id), `role`
  /// and exactly `password`.
  ///
  /// A wrong password and an unknown identifier are indistinguishable.
  pub fn login(&self, identifier: &str, password: &str, role: Role) -> Option<User> {
    self
      .read()
      .users
      .iter()
      .find(|u| u.accepts_login(identifier, password, role))
      .cloned()
  }

  // ── Subscribers ───────────────────────────────────────────────────────

  pub fn subscribe(&self, callback: impl Fn(&StoreEvent) + Send + Sync + 'static) -> Subscription {
    self.inner.subscribers.subscribe(callback)
  }

  fn emit(&self, event: StoreEvent) { self.inner.subscribers.emit(&event); }

  // ── Commands ──────────────────────────────────────────────────────────

  /// Register a citizen. Duplicate registrations are accepted.
  pub async fn register(&self, input: NewUser) -> Result<User> {
    let _gate = self.inner.gate.lock().await;
    let now = self.inner.clock.now();
    let user = input.into_citizen();

    let ((), snapshot) = self.mutate(|db| {
      db.users.push(user.clone());
      db.audit_logs.push(AuditLogEntry::new(
        now,
        AuditAction::RegisterUser,
        &user.name,
        &user.email,
      ));
    });
    self.publish(snapshot).await?;

    info!(email = %user.email, "citizen registered");
    Ok(user)
  }

  /// File a new report on behalf of `submitter`. The report becomes the
  /// first element of [`reports`](Self::reports).
  pub async fn create_report(&self, form: NewReport, submitter: &User) -> Result<DetailedReport> {
    let gate = self.inner.gate.lock().await;
    let now = self.inner.clock.now();
    let id = self.inner.ids.next_id();
    let report = form.into_report(id, &submitter.name, now);

    let ((), snapshot) = self.mutate(|db| {
      db.reports.insert(0, report.clone());
      db.audit_logs.push(AuditLogEntry::new(
        now,
        AuditAction::CreateReport,
        &submitter.name,
        id,
      ));
    });
    self.publish(snapshot).await?;
    drop(gate);

    info!(id, category = %report.category, "report created");
    self.emit(StoreEvent::NewIssue(report.clone()));
    Ok(report)
  }

  /// Merge `patch` into report `id`. Returns `None`, touching nothing, if no
  /// such report exists.
  pub async fn update_report(
    &self,
    id: i64,
    patch: ReportPatch,
    actor: &str,
  ) -> Result<Option<DetailedReport>> {
    let gate = self.inner.gate.lock().await;
    let now = self.inner.clock.now();

    let (updated, snapshot) = self.mutate(|db| {
      let report = db.report_mut(id)?;
      report.apply(patch, actor, now);
      let report = report.clone();
      db.audit_logs.push(AuditLogEntry::new(now, AuditAction::UpdateReport, actor, id));
      Some(report)
    });
    let Some(report) = updated else {
      debug!(id, "update for unknown report ignored");
      return Ok(None);
    };
    self.publish(snapshot).await?;
    drop(gate);

    info!(id, status = %report.status, actor, "report updated");
    self.emit(StoreEvent::IssueUpdated(report.clone()));
    Ok(Some(report))
  }

  /// Raise an SOS alert for `user` at their current coordinate. The alert
  /// becomes the first element of [`sos_alerts`](Self::sos_alerts).
  pub async fn create_sos_alert(&self, user: &User, video: Option<String>) -> Result<SosAlert> {
    let gate = self.inner.gate.lock().await;
    let now = self.inner.clock.now();
    let alert = SosAlert::raise(self.inner.ids.next_id(), user, video, now);

    let ((), snapshot) = self.mutate(|db| {
      db.sos.insert(0, alert.clone());
      db.audit_logs.push(AuditLogEntry::new(
        now,
        AuditAction::CreateSos,
        &user.name,
        alert.id,
      ));
    });
    self.publish(snapshot).await?;
    drop(gate);

    info!(id = alert.id, user = %alert.user_name, "SOS raised");
    self.emit(StoreEvent::SosAlert(alert.clone()));
    Ok(alert)
  }

  /// Mark alert `id` resolved. An unknown id is a silent no-op: nothing is
  /// persisted or emitted and `None` is returned.
  pub async fn resolve_sos_alert(&self, id: i64, actor: &str) -> Result<Option<SosAlert>> {
    let gate = self.inner.gate.lock().await;
    let now = self.inner.clock.now();

    let (resolved, snapshot) = self.mutate(|db| {
      let alert = db.sos_mut(id)?;
      alert.status = SosStatus::Resolved;
      let alert = alert.clone();
      db.audit_logs.push(AuditLogEntry::new(now, AuditAction::ResolveSos, actor, id));
      Some(alert)
    });
    let Some(alert) = resolved else {
      return Ok(None);
    };
    self.publish(snapshot).await?;
    drop(gate);

    info!(id, actor, "SOS resolved");
    self.emit(StoreEvent::SosResolved(id));
    Ok(Some(alert))
  }

  /// Persist `snapshot`, then replicate it to the same-device channel and to
  /// every open peer.
  async fn publish(&self, snapshot: Database) -> Result<()> {
    self.inner.persistence.save(&snapshot).await?;

    if let Some(tab) = &self.inner.tab {
      tab.post(TabMessage::RemoteUpdate(snapshot.clone()));
    }

    let mut peers = self.inner.peers.lock().unwrap_or_else(PoisonError::into_inner);
    peers.retain(|p| p.state() != ConnectionState::Closed);
    let mut pushed = 0;
    for peer in peers.iter() {
      if peer.send(PeerMessage::PartialUpdate(snapshot.clone())) {
        pushed += 1;
      }
    }
    debug!(peers = pushed, "snapshot replicated");
    Ok(())
  }

  // ── Inbound replication ───────────────────────────────────────────────

  /// Replace the local store with a replicated snapshot (through the merge
  /// strategy) and emit `CLOUD_SYNC`. Never re-broadcasts.
  pub async fn apply_snapshot(&self, incoming: Database, source: ReplicationSource) -> Result<()> {
    let gate = self.inner.gate.lock().await;

    let ((), snapshot) = self.mutate(|db| {
      let merged = self.inner.merge.merge(db, incoming);
      *db = merged;
    });
    if source == ReplicationSource::Peer {
      self.inner.persistence.save(&snapshot).await?;
    }
    drop(gate);

    debug!(?source, reports = snapshot.reports.len(), "snapshot applied");
    self.emit(StoreEvent::CloudSync(Box::new(snapshot)));
    Ok(())
  }

  // ── Peer overlay ──────────────────────────────────────────────────────

  /// The overlay identity, once [`initialize_cloud_sync`] has succeeded.
  ///
  /// [`initialize_cloud_sync`]: Self::initialize_cloud_sync
  pub fn cloud_id(&self) -> Option<String> {
    self.cloud().as_ref().map(|c| c.id.clone())
  }

  fn cloud(&self) -> MutexGuard<'_, Option<CloudIdentity>> {
    self.inner.cloud.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn is_hub(&self) -> bool {
    matches!(self.cloud().as_ref(), Some(CloudIdentity { role: Role::Official, .. }))
  }

  /// Connections currently in the fan-out list.
  pub fn peers(&self) -> Vec<Arc<PeerConnection>> {
    self.inner.peers.lock().unwrap_or_else(PoisonError::into_inner).clone()
  }

  /// Join the peer overlay as `user`. Officials advertise the configured
  /// stable hub identity; citizens advertise a random one. Emits
  /// `CLOUD_ONLINE` and returns the cloud id. Calling it again returns the
  /// existing id.
  pub async fn initialize_cloud_sync<S: Signaling>(&self, signaling: &S, user: &User) -> Result<String> {
    if let Some(id) = self.cloud_id() {
      return Ok(id);
    }

    let requested = match user.role {
      Role::Official => self.inner.config.hub_id.clone(),
      Role::Citizen => format!("citizen-{}", &Uuid::new_v4().simple().to_string()[..8]),
    };
    let Advertisement { cloud_id, mut incoming } = signaling.advertise(&requested).await?;
    *self.cloud() = Some(CloudIdentity { id: cloud_id.clone(), role: user.role });

    let weak = Arc::downgrade(&self.inner);
    tokio::spawn(async move {
      while let Some(link) = incoming.recv().await {
        let Some(inner) = weak.upgrade() else { break };
        let service = CivicService { inner };
        let conn = PeerConnection::connecting(link.remote_id.clone());
        service.attach(conn, link);
      }
    });

    info!(cloud_id = %cloud_id, role = %user.role, "cloud sync online");
    self.emit(StoreEvent::CloudOnline(cloud_id.clone()));
    Ok(cloud_id)
  }

  /// Dial the instance advertising `target` and add the link to the fan-out
  /// list once open.
  pub async fn connect_to_cloud<S: Signaling>(
    &self,
    signaling: &S,
    target: &str,
  ) -> Result<Arc<PeerConnection>> {
    let local_id = self.cloud_id().ok_or(Error::CloudNotInitialized)?;
    let conn = PeerConnection::connecting(target);
    match signaling.dial(&local_id, target).await {
      Ok(link) => {
        self.attach(conn.clone(), link);
        Ok(conn)
      }
      Err(e) => {
        conn.close();
        Err(e)
      }
    }
  }

  /// Open `conn` over `link`: add it to the fan-out list, emit
  /// `PEER_CONNECTED`, schedule the hub bootstrap and start reading.
  fn attach(&self, conn: Arc<PeerConnection>, link: PeerLink) {
    let PeerLink { remote_id, outbound, mut inbound } = link;
    conn.open(outbound);
    self
      .inner
      .peers
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push(conn.clone());
    info!(peer = %remote_id, "peer connection open");
    self.emit(StoreEvent::PeerConnected(remote_id.clone()));

    if self.is_hub() {
      let delay = self.inner.config.bootstrap_delay();
      let weak = Arc::downgrade(&self.inner);
      let conn = conn.clone();
      tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let Some(inner) = weak.upgrade() else { return };
        let snapshot = CivicService { inner }.snapshot();
        if conn.send(PeerMessage::FullSync(snapshot)) {
          debug!(peer = %conn.remote_id(), "bootstrap snapshot sent");
        }
      });
    }

    let weak: Weak<Inner<K>> = Arc::downgrade(&self.inner);
    tokio::spawn(async move {
      while let Some(message) = inbound.recv().await {
        let Some(inner) = weak.upgrade() else { break };
        let service = CivicService { inner };
        debug!(peer = %remote_id, kind = message.kind(), "peer snapshot received");
        if let Err(e) = service
          .apply_snapshot(message.into_snapshot(), ReplicationSource::Peer)
          .await
        {
          warn!(peer = %remote_id, error = %e, "failed to apply peer snapshot");
        }
      }
      conn.close();
      info!(peer = %remote_id, "peer connection closed");
    });
  }
}

async fn pump_same_device<K: KeyValueStore>(weak: Weak<Inner<K>>, mut rx: TabReceiver) {
  while let Some(message) = rx.recv().await {
    let Some(inner) = weak.upgrade() else { break };
    let service = CivicService { inner };
    if let Err(e) = service
      .apply_snapshot(message.into_snapshot(), ReplicationSource::SameDevice)
      .await
    {
      warn!(error = %e, "failed to apply same-device snapshot");
    }
  }
}
