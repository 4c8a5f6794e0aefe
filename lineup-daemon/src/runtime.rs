use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::os::unix::net::UnixStream as StdUnixStream;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use notify::{recommended_watcher, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tokio::time::Instant;

use lineup_core::config::{config_path_at, load_config_at};
use lineup_core::paths::catalogs_dir;
use lineup_core::types::ItemType;
use lineup_core::ScopeConfig;
use lineup_engine::reconcile::{reconcile_at, ReconcileOutcome};
use lineup_engine::staleness;

use crate::error::{io_err, DaemonError};
use crate::paths::{logs_dir, run_dir, socket_path, DEBOUNCE_WINDOW};
use crate::protocol::{DaemonRequest, DaemonResponse};

pub type ConfigCache = std::sync::Arc<RwLock<ScopeConfig>>;

/// Per-type last-successful-reconcile timestamps (Unix seconds).
pub type ReconcileTimestamps = HashMap<String, u64>;

#[derive(Debug, Clone)]
enum ReconcileTarget {
    All,
    Type(String),
}

impl ReconcileTarget {
    fn label(&self) -> String {
        match self {
            ReconcileTarget::All => "all".to_string(),
            ReconcileTarget::Type(name) => name.clone(),
        }
    }
}

struct ReconcileJob {
    target: ReconcileTarget,
    source: &'static str,
    respond_to: oneshot::Sender<Result<ReconcileSummary, String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconcileSummary {
    pub target: String,
    pub source: String,
    pub item_types: Vec<String>,
    pub resequenced: usize,
    pub unchanged: usize,
    pub duration_ms: u128,
}

/// Start the daemon runtime and block the current thread until it exits.
pub fn start_blocking(home: &Path) -> Result<(), DaemonError> {
    init_tracing();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(home.to_path_buf()))
}

/// Run the daemon runtime.
pub async fn run(home: PathBuf) -> Result<(), DaemonError> {
    ensure_runtime_dirs(&home)?;

    let config: ConfigCache = std::sync::Arc::new(RwLock::new(load_config_at(&home)?));
    let timestamps: std::sync::Arc<RwLock<ReconcileTimestamps>> =
        std::sync::Arc::new(RwLock::new(HashMap::new()));
    let started_at_unix = unix_seconds_now();

    let (job_tx, job_rx) = mpsc::channel::<ReconcileJob>(64);
    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    let watcher_handle = {
        let shutdown = shutdown_tx.clone();
        let home = home.clone();
        let config = config.clone();
        let job_tx = job_tx.clone();
        tokio::spawn(async move {
            let result = watcher_task(home, config, job_tx, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let processor_handle = {
        let shutdown = shutdown_tx.clone();
        let home = home.clone();
        let config = config.clone();
        let timestamps = timestamps.clone();
        tokio::spawn(async move {
            let result =
                reconcile_processor_task(home, config, timestamps, job_rx, shutdown.subscribe())
                    .await;
            let _ = shutdown.send(());
            result
        })
    };

    let socket_handle = {
        let shutdown = shutdown_tx.clone();
        let home = home.clone();
        let config = config.clone();
        let timestamps = timestamps.clone();
        let job_tx = job_tx.clone();
        tokio::spawn(async move {
            let result = socket_server_task(
                home,
                config,
                timestamps,
                job_tx,
                shutdown.clone(),
                shutdown.subscribe(),
                started_at_unix,
            )
            .await;
            let _ = shutdown.send(());
            result
        })
    };

    let rotation_handle = {
        let shutdown = shutdown_tx.clone();
        let home = home.clone();
        tokio::spawn(async move {
            let result = log_rotation_task(home, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let mut shutdown_rx = shutdown.subscribe();
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => {
                            tracing::info!("received ctrl-c, shutting down daemon");
                            let _ = shutdown.send(());
                            Ok(())
                        }
                        Err(err) => Err(DaemonError::Protocol(format!("ctrl-c handler failed: {err}"))),
                    }
                }
            }
        })
    };

    let (watcher_result, processor_result, socket_result, rotation_result, signal_result) =
        tokio::join!(
            watcher_handle,
            processor_handle,
            socket_handle,
            rotation_handle,
            signal_handle
        );

    handle_join("watcher", watcher_result)?;
    handle_join("reconcile_processor", processor_result)?;
    handle_join("socket_server", socket_result)?;
    handle_join("log_rotation", rotation_result)?;
    handle_join("signal_handler", signal_result)?;
    Ok(())
}

async fn watcher_task(
    home: PathBuf,
    config: ConfigCache,
    job_tx: mpsc::Sender<ReconcileJob>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let catalogs = catalogs_dir(&home);
    if !catalogs.exists() {
        fs::create_dir_all(&catalogs).map_err(|e| io_err(&catalogs, e))?;
    }

    // Canonicalize so that FSEvents paths (which arrive as real paths, e.g.
    // /private/var/... on macOS) match the prefix checks below.
    let catalogs = fs::canonicalize(&catalogs).unwrap_or(catalogs);
    let config_file = config_path_at(&home);

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();
    let mut _watcher: RecommendedWatcher = recommended_watcher(move |event| {
        let _ = event_tx.send(event);
    })?;
    _watcher.watch(&catalogs, RecursiveMode::NonRecursive)?;
    if let Some(root) = config_file.parent() {
        _watcher.watch(root, RecursiveMode::NonRecursive)?;
    }

    let mut debounce = HashMap::<PathBuf, Instant>::new();

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            event = event_rx.recv() => {
                let Some(event) = event else { break };
                let event = match event {
                    Ok(event) => event,
                    Err(err) => {
                        tracing::warn!(error = %err, "watcher event error");
                        continue;
                    }
                };
                if !is_relevant_event_kind(&event.kind) {
                    continue;
                }

                for path in event.paths {
                    if path.file_name() == config_file.file_name() {
                        if let Err(err) = refresh_config(home.clone(), config.clone()).await {
                            tracing::warn!(error = %err, "config reload failed");
                        } else {
                            tracing::info!("scope config reloaded");
                        }
                        continue;
                    }

                    let Some(item_type) = catalog_type_for_path(&path, &catalogs) else {
                        continue;
                    };

                    if !should_process_event(&mut debounce, &path, Instant::now()) {
                        continue;
                    }

                    match enqueue_reconcile(&job_tx, ReconcileTarget::Type(item_type), "watcher")
                        .await
                    {
                        Ok(summary) => {
                            tracing::info!(
                                reconciled = %summary.target,
                                resequenced = summary.resequenced,
                                unchanged = summary.unchanged,
                                duration_ms = summary.duration_ms,
                                "watcher-triggered reconcile completed",
                            );
                        }
                        Err(err) => {
                            tracing::error!(error = %err, "watcher-triggered reconcile failed");
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

async fn reconcile_processor_task(
    home: PathBuf,
    config: ConfigCache,
    timestamps: std::sync::Arc<RwLock<ReconcileTimestamps>>,
    mut job_rx: mpsc::Receiver<ReconcileJob>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            maybe_job = job_rx.recv() => {
                let Some(job) = maybe_job else { break };
                let started = Instant::now();

                let target = job.target.clone();
                let source = job.source;
                let home_for_job = home.clone();
                let config_snapshot = config.read().await.clone();
                let result = tokio::task::spawn_blocking(move || {
                    reconcile_target_blocking(&home_for_job, &config_snapshot, &target)
                })
                .await
                .map_err(|err| DaemonError::Protocol(format!("reconcile task join error: {err}")))?;

                let outcome = match result {
                    Ok(results) => {
                        let now = unix_seconds_now();
                        let mut ts = timestamps.write().await;
                        for (name, _) in &results {
                            ts.insert(name.clone(), now);
                        }
                        drop(ts);
                        Ok(build_summary(job.target, source, results, started.elapsed()))
                    }
                    Err(err) => Err(err.to_string()),
                };

                let _ = job.respond_to.send(outcome);
            }
        }
    }

    Ok(())
}

/// Reconcile one type or every enabled type, clearing staleness flags for
/// everything repaired. Runs on the blocking pool.
fn reconcile_target_blocking(
    home: &Path,
    config: &ScopeConfig,
    target: &ReconcileTarget,
) -> Result<Vec<(String, ReconcileOutcome)>, DaemonError> {
    let types: Vec<ItemType> = match target {
        ReconcileTarget::All => config.item_types.clone(),
        ReconcileTarget::Type(name) => {
            let item_type = ItemType::from(name.as_str());
            if !config.type_enabled(&item_type) {
                tracing::debug!("'{item_type}' is not order-enabled, skipping reconcile");
                return Ok(vec![]);
            }
            vec![item_type]
        }
    };

    let mut results = Vec::with_capacity(types.len());
    for item_type in types {
        let outcome = reconcile_at(home, config, &item_type)?;
        staleness::clear_at(home, &item_type)?;
        results.push((item_type.0, outcome));
    }
    Ok(results)
}

async fn socket_server_task(
    home: PathBuf,
    config: ConfigCache,
    timestamps: std::sync::Arc<RwLock<ReconcileTimestamps>>,
    job_tx: mpsc::Sender<ReconcileJob>,
    shutdown_tx: broadcast::Sender<()>,
    mut shutdown_rx: broadcast::Receiver<()>,
    started_at_unix: u64,
) -> Result<(), DaemonError> {
    let run = run_dir(&home);
    if !run.exists() {
        fs::create_dir_all(&run).map_err(|e| io_err(&run, e))?;
    }

    let socket = socket_path(&home);
    prepare_socket_for_bind(&socket)?;

    let listener = UnixListener::bind(&socket).map_err(|e| io_err(&socket, e))?;
    set_socket_permissions(&socket)?;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            accepted = listener.accept() => {
                let (stream, _) = accepted.map_err(|e| io_err(&socket, e))?;
                let home = home.clone();
                let config = config.clone();
                let timestamps = timestamps.clone();
                let job_tx = job_tx.clone();
                let shutdown_tx = shutdown_tx.clone();
                tokio::spawn(async move {
                    if let Err(err) = handle_socket_client(
                        stream,
                        home,
                        config,
                        timestamps,
                        job_tx,
                        shutdown_tx,
                        started_at_unix,
                    ).await {
                        tracing::error!(error = %err, "socket client error");
                    }
                });
            }
        }
    }

    if socket.exists() {
        let _ = fs::remove_file(&socket);
    }
    Ok(())
}

async fn handle_socket_client(
    stream: UnixStream,
    home: PathBuf,
    config: ConfigCache,
    timestamps: std::sync::Arc<RwLock<ReconcileTimestamps>>,
    job_tx: mpsc::Sender<ReconcileJob>,
    shutdown_tx: broadcast::Sender<()>,
    started_at_unix: u64,
) -> Result<(), DaemonError> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| io_err("daemon socket read", e))?
    {
        if line.trim().is_empty() {
            continue;
        }

        let request: Result<DaemonRequest, _> = serde_json::from_str(&line);
        let request = match request {
            Ok(request) => request,
            Err(err) => {
                write_response(
                    &mut writer,
                    &DaemonResponse::error(format!("invalid request JSON: {err}")),
                )
                .await?;
                continue;
            }
        };

        let cmd = request.cmd.clone();
        let item_type = request.item_type.clone();

        let response = match cmd.as_str() {
            "status" => {
                let payload = build_status_payload(
                    &home,
                    config.clone(),
                    timestamps.clone(),
                    started_at_unix,
                )
                .await;
                DaemonResponse::ok(payload)
            }
            "reconcile" => {
                let target = match item_type {
                    Some(name) => ReconcileTarget::Type(name),
                    None => ReconcileTarget::All,
                };
                match enqueue_reconcile(&job_tx, target, "socket").await {
                    Ok(summary) => DaemonResponse::ok(json!(summary)),
                    Err(err) => DaemonResponse::error(err.to_string()),
                }
            }
            "stop" => {
                let _ = shutdown_tx.send(());
                DaemonResponse::ok(json!({ "stopping": true }))
            }
            other => DaemonResponse::error(format!("unknown command '{other}'")),
        };

        write_response(&mut writer, &response).await?;
        if cmd == "stop" {
            break;
        }
    }

    Ok(())
}

async fn build_status_payload(
    home: &Path,
    config: ConfigCache,
    timestamps: std::sync::Arc<RwLock<ReconcileTimestamps>>,
    started_at_unix: u64,
) -> Value {
    // Enabled types from the config cache (read lock, dropped immediately).
    let enabled: Vec<ItemType> = {
        let config = config.read().await;
        let mut v = config.item_types.clone();
        v.sort();
        v
    };

    let ts_snapshot: HashMap<String, u64> = {
        let ts = timestamps.read().await;
        ts.clone()
    };

    let item_types: Vec<Value> = enabled
        .iter()
        .map(|item_type| {
            let dirty = staleness::is_dirty_at(home, item_type).unwrap_or(false);
            let last = ts_snapshot.get(&item_type.0).copied().unwrap_or(0);
            json!({
                "name": item_type.0,
                "dirty": dirty,
                "last_reconcile_at_unix": last,
            })
        })
        .collect();

    let last_reconcile_at_unix = ts_snapshot.values().copied().max().unwrap_or(0);

    json!({
        "running": true,
        "label": crate::paths::DAEMON_LABEL,
        "started_at_unix": started_at_unix,
        "last_reconcile_at_unix": last_reconcile_at_unix,
        "item_types": item_types,
        "socket": socket_path(home).display().to_string(),
        "catalogs_root": catalogs_dir(home).display().to_string(),
    })
}

async fn enqueue_reconcile(
    job_tx: &mpsc::Sender<ReconcileJob>,
    target: ReconcileTarget,
    source: &'static str,
) -> Result<ReconcileSummary, DaemonError> {
    let (tx, rx) = oneshot::channel();
    job_tx
        .send(ReconcileJob {
            target,
            source,
            respond_to: tx,
        })
        .await
        .map_err(|_| DaemonError::ChannelClosed("reconcile queue"))?;

    let outcome = rx
        .await
        .map_err(|_| DaemonError::ChannelClosed("reconcile response"))?;
    outcome.map_err(DaemonError::Protocol)
}

async fn refresh_config(home: PathBuf, config: ConfigCache) -> Result<(), DaemonError> {
    let reloaded = tokio::task::spawn_blocking(move || load_config_at(&home))
        .await
        .map_err(|err| DaemonError::Protocol(format!("config reload join error: {err}")))??;
    let mut guard = config.write().await;
    *guard = reloaded;
    Ok(())
}

async fn log_rotation_task(
    home: PathBuf,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let mut interval = tokio::time::interval(Duration::from_secs(5));
    // Skip the first (immediate) tick to avoid rotating on startup.
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    interval.tick().await;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = interval.tick() => {
                let home = home.clone();
                tokio::task::spawn_blocking(move || {
                    crate::log_rotation::rotate_logs(&home);
                })
                .await
                .ok(); // rotation errors are logged inside rotate_logs; never crash the daemon
            }
        }
    }
    Ok(())
}

fn build_summary(
    target: ReconcileTarget,
    source: &'static str,
    results: Vec<(String, ReconcileOutcome)>,
    duration: Duration,
) -> ReconcileSummary {
    let mut item_types = Vec::new();
    let mut resequenced = 0usize;
    let mut unchanged = 0usize;

    for (name, outcome) in results {
        item_types.push(name);
        match outcome {
            ReconcileOutcome::Resequenced { .. } => resequenced += 1,
            ReconcileOutcome::AlreadyDense | ReconcileOutcome::Empty => unchanged += 1,
        }
    }

    ReconcileSummary {
        target: target.label(),
        source: source.to_string(),
        item_types,
        resequenced,
        unchanged,
        duration_ms: duration.as_millis(),
    }
}

fn is_relevant_event_kind(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(_))
}

/// The item type a catalog file event refers to, if it is one.
fn catalog_type_for_path(path: &Path, catalogs: &Path) -> Option<String> {
    if !path.starts_with(catalogs) {
        return None;
    }
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yaml"))
        .unwrap_or(false);
    if !is_yaml {
        return None;
    }
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| stem.to_string())
}

fn prepare_socket_for_bind(socket: &Path) -> Result<(), DaemonError> {
    if !socket.exists() {
        return Ok(());
    }

    match StdUnixStream::connect(socket) {
        Ok(_) => {
            return Err(DaemonError::Protocol(format!(
                "daemon socket already in use: {}",
                socket.display()
            )));
        }
        Err(err) => {
            tracing::warn!(
                socket = %socket.display(),
                error = %err,
                "removing stale daemon socket before bind",
            );
        }
    }

    match fs::remove_file(socket) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_err(socket, err)),
    }
}

fn should_process_event(
    debounce: &mut HashMap<PathBuf, Instant>,
    path: &Path,
    now: Instant,
) -> bool {
    should_process_event_with_threshold(debounce, path, now, DEBOUNCE_WINDOW)
}

fn should_process_event_with_threshold(
    debounce: &mut HashMap<PathBuf, Instant>,
    path: &Path,
    now: Instant,
    threshold: Duration,
) -> bool {
    debounce.retain(|_, seen_at| now.duration_since(*seen_at) <= Duration::from_secs(30));
    match debounce.get(path) {
        Some(last_seen) if now.duration_since(*last_seen) < threshold => false,
        _ => {
            debounce.insert(path.to_path_buf(), now);
            true
        }
    }
}

fn ensure_runtime_dirs(home: &Path) -> Result<(), DaemonError> {
    let catalogs = catalogs_dir(home);
    if !catalogs.exists() {
        fs::create_dir_all(&catalogs).map_err(|e| io_err(&catalogs, e))?;
    }
    let run = run_dir(home);
    if !run.exists() {
        fs::create_dir_all(&run).map_err(|e| io_err(&run, e))?;
    }
    let logs = logs_dir(home);
    if !logs.exists() {
        fs::create_dir_all(&logs).map_err(|e| io_err(&logs, e))?;
    }
    Ok(())
}

async fn write_response(
    writer: &mut OwnedWriteHalf,
    response: &DaemonResponse,
) -> Result<(), DaemonError> {
    let payload = serde_json::to_string(response)?;
    writer
        .write_all(payload.as_bytes())
        .await
        .map_err(|e| io_err("daemon socket write", e))?;
    writer
        .write_all(b"\n")
        .await
        .map_err(|e| io_err("daemon socket write", e))?;
    writer
        .flush()
        .await
        .map_err(|e| io_err("daemon socket flush", e))?;
    Ok(())
}

fn handle_join(
    task: &str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Protocol(format!(
            "{task} task join failure: {err}"
        ))),
    }
}

fn unix_seconds_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

#[cfg(unix)]
fn set_socket_permissions(path: &Path) -> Result<(), DaemonError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_socket_permissions(_path: &Path) -> Result<(), DaemonError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;
    use lineup_core::catalog::save_catalog_at;
    use lineup_core::types::{Catalog, Item, ItemId, ItemStatus};
    use serde_json::json;
    use tempfile::TempDir;
    use tokio::sync::{broadcast, mpsc, RwLock};
    use tokio::time::advance;

    fn article() -> ItemType {
        ItemType::from("article")
    }

    fn gapped_catalog(home: &Path) {
        let now = Utc::now();
        let mut catalog = Catalog {
            item_type: article(),
            items: [(1u64, 0i64), (2, 4), (3, 9)]
                .iter()
                .map(|&(id, order)| Item {
                    id: ItemId(id),
                    title: format!("item {id}"),
                    status: ItemStatus::Published,
                    primary_order: order,
                    created_at: now,
                    terms: vec![],
                })
                .collect(),
            created_at: now,
            updated_at: now,
        };
        save_catalog_at(home, &mut catalog).expect("save");
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn debounce_coalesces_rapid_events() {
        let threshold = Duration::from_millis(100);
        let mut debounce = HashMap::<PathBuf, Instant>::new();
        let path = PathBuf::from("/tmp/article.yaml");
        let mut triggers = 0usize;

        for _ in 0..5 {
            if should_process_event_with_threshold(&mut debounce, &path, Instant::now(), threshold)
            {
                triggers += 1;
            }
            advance(Duration::from_millis(10)).await;
        }

        advance(Duration::from_millis(150)).await;
        assert_eq!(
            triggers, 1,
            "rapid catalog saves should collapse to one reconcile trigger"
        );
    }

    #[test]
    fn catalog_events_resolve_to_their_item_type() {
        let catalogs = PathBuf::from("/home/u/.lineup/catalogs");
        assert_eq!(
            catalog_type_for_path(&catalogs.join("article.yaml"), &catalogs),
            Some("article".to_string())
        );
        assert_eq!(
            catalog_type_for_path(&catalogs.join("article.yaml.tmp"), &catalogs),
            None,
            "atomic-write temp files are not catalog events"
        );
        assert_eq!(
            catalog_type_for_path(Path::new("/elsewhere/article.yaml"), &catalogs),
            None
        );
    }

    #[test]
    fn reconcile_target_repairs_enabled_type_and_clears_flag() {
        let home = TempDir::new().expect("home");
        gapped_catalog(home.path());
        staleness::mark_dirty_at(home.path(), &article()).expect("mark");

        let mut config = ScopeConfig::default();
        config.item_types.push(article());

        let results = reconcile_target_blocking(
            home.path(),
            &config,
            &ReconcileTarget::Type("article".to_string()),
        )
        .expect("reconcile");

        assert_eq!(results.len(), 1);
        assert!(matches!(
            results[0].1,
            ReconcileOutcome::Resequenced { count: 3 }
        ));
        assert!(!staleness::is_dirty_at(home.path(), &article()).expect("check"));
    }

    #[test]
    fn reconcile_target_skips_disabled_type() {
        let home = TempDir::new().expect("home");
        gapped_catalog(home.path());
        let results = reconcile_target_blocking(
            home.path(),
            &ScopeConfig::default(),
            &ReconcileTarget::Type("article".to_string()),
        )
        .expect("reconcile");
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn socket_protocol_status_and_stop_over_in_memory_channels() {
        let (request_tx, mut request_rx) = mpsc::channel::<Vec<u8>>(8);
        let (response_tx, mut response_rx) = mpsc::channel::<Vec<u8>>(8);
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);

        tokio::spawn(async move {
            while let Some(bytes) = request_rx.recv().await {
                let line = String::from_utf8(bytes).expect("utf8");
                let request: DaemonRequest = serde_json::from_str(line.trim()).expect("request");
                let response = match request.cmd.as_str() {
                    "status" => DaemonResponse::ok(json!({"running": true})),
                    "stop" => {
                        let _ = shutdown_tx.send(());
                        DaemonResponse::ok(json!({"stopping": true}))
                    }
                    other => DaemonResponse::error(format!("unknown command '{other}'")),
                };
                let encoded = serde_json::to_vec(&response).expect("encode response");
                if response_tx.send(encoded).await.is_err() {
                    break;
                }
            }
        });

        request_tx
            .send(br#"{"cmd":"status"}"#.to_vec())
            .await
            .expect("send status request");
        let status_response = response_rx.recv().await.expect("status response");
        let status_json: serde_json::Value =
            serde_json::from_slice(&status_response).expect("decode status");
        assert_eq!(status_json["ok"], serde_json::Value::Bool(true));

        request_tx
            .send(br#"{"cmd":"stop"}"#.to_vec())
            .await
            .expect("send stop request");
        let stop_response = response_rx.recv().await.expect("stop response");
        let stop_json: serde_json::Value =
            serde_json::from_slice(&stop_response).expect("decode stop");
        assert_eq!(stop_json["ok"], serde_json::Value::Bool(true));

        shutdown_rx.recv().await.expect("shutdown signal");
    }

    #[tokio::test]
    async fn status_payload_before_any_reconcile() {
        let home = TempDir::new().expect("home");
        let config = std::sync::Arc::new(RwLock::new(ScopeConfig::default()));
        let timestamps = std::sync::Arc::new(RwLock::new(ReconcileTimestamps::new()));

        let payload = build_status_payload(home.path(), config, timestamps, 1_000_000).await;

        assert_eq!(payload["running"], json!(true));
        assert_eq!(payload["started_at_unix"], json!(1_000_000u64));
        assert_eq!(payload["last_reconcile_at_unix"], json!(0u64));
        let item_types = payload["item_types"].as_array().expect("item_types array");
        assert!(item_types.is_empty());
    }

    #[tokio::test]
    async fn status_payload_reports_per_type_state() {
        let home = TempDir::new().expect("home");
        staleness::mark_dirty_at(home.path(), &article()).expect("mark");

        let mut scope = ScopeConfig::default();
        scope.item_types.push(article());
        scope.item_types.push(ItemType::from("page"));
        let config = std::sync::Arc::new(RwLock::new(scope));

        let ts_map: ReconcileTimestamps =
            [("page".to_string(), 1_000_200u64)].into_iter().collect();
        let timestamps = std::sync::Arc::new(RwLock::new(ts_map));

        let payload = build_status_payload(home.path(), config, timestamps, 1_000_000).await;

        assert_eq!(payload["last_reconcile_at_unix"], json!(1_000_200u64));
        let item_types = payload["item_types"].as_array().expect("item_types array");
        assert_eq!(item_types.len(), 2);
        for entry in item_types {
            match entry["name"].as_str().expect("name") {
                "article" => {
                    assert_eq!(entry["dirty"], json!(true));
                    assert_eq!(entry["last_reconcile_at_unix"], json!(0u64));
                }
                "page" => {
                    assert_eq!(entry["dirty"], json!(false));
                    assert_eq!(entry["last_reconcile_at_unix"], json!(1_000_200u64));
                }
                other => panic!("unexpected item type: {other}"),
            }
        }
    }
}
